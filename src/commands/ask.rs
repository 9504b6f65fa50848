use anyhow::Result;

use storyground::pipeline::StoryPipeline;
use storyground::utils::capitalize;

pub async fn ask(pipeline: &StoryPipeline, session: &str, question: &str) -> Result<()> {
    let answer = pipeline.answer_question(session, question).await?;

    println!("{}", answer.document);
    println!();
    if answer.cached {
        println!("(cached answer)");
    }
    if let Some(reason) = answer.fallback {
        println!("(fallback answer: {})", reason.as_str());
    }
    tracing::debug!(outcome = answer.outcome.as_str(), paths = answer.paths.len(), "Answer delivered");
    Ok(())
}

pub async fn path(pipeline: &StoryPipeline, session: &str, from: &str, to: &str) -> Result<()> {
    match pipeline.find_path(session, from, to).await? {
        Some(path) => {
            println!("{path}");
            println!("({} hops)", path.hops());
        }
        None => println!("No path between '{from}' and '{to}'."),
    }
    Ok(())
}

pub async fn neighbors(pipeline: &StoryPipeline, session: &str, concept: &str, hops: usize) -> Result<()> {
    let found = pipeline.neighbors(session, concept, hops).await?;
    if found.is_empty() {
        println!("No neighbors found for '{concept}'.");
        return Ok(());
    }

    println!("Neighbors of '{}' within {hops} hop(s):", capitalize(concept));
    for neighbor in found {
        println!(
            "  {} [{}] (distance {})",
            neighbor.label, neighbor.relation, neighbor.distance
        );
    }
    Ok(())
}

pub async fn concept(pipeline: &StoryPipeline, session: &str, concept: &str) -> Result<()> {
    println!("{}", pipeline.summarize(session, concept).await?);
    Ok(())
}
