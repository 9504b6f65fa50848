use anyhow::Result;

use storyground::pipeline::StoryPipeline;
use storyground::session::Role;

pub async fn list_sessions(pipeline: &StoryPipeline) -> Result<()> {
    let sessions = pipeline.sessions().list().await?;
    if sessions.is_empty() {
        println!("No sessions yet. Run 'storyground analyze' to create one.");
        return Ok(());
    }

    for summary in sessions {
        println!(
            "{}  {:<20}  {}  {} messages{}",
            summary.id,
            summary.name,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.message_count,
            if summary.analyzed { "" } else { "  (not analyzed)" }
        );
    }
    Ok(())
}

pub async fn show_session(pipeline: &StoryPipeline, id: &str) -> Result<()> {
    let session = pipeline.session(id).await?;

    println!("{} ({})", session.name, session.id);
    println!("Created: {}", session.created_at.format("%Y-%m-%d %H:%M:%S"));
    if session.is_analyzed() {
        let stats = session.graph.stats();
        println!("Concepts: {}", session.concepts.join(", "));
        println!("Cultural context: {}", session.cultural_context.dominant_culture);
        println!(
            "Graph: {} nodes, {} relationships, depth {}",
            stats.total_nodes, stats.total_edges, stats.depth
        );
    }
    println!();

    for message in &session.messages {
        let who = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let cached = if message.cached { " (cached)" } else { "" };
        println!("[{}] {who}{cached}:", message.timestamp.format("%H:%M:%S"));
        println!("{}", message.content);
        println!();
    }
    Ok(())
}

pub async fn rename_session(pipeline: &StoryPipeline, id: &str, name: &str) -> Result<()> {
    let session = pipeline.rename_session(id, name).await?;
    println!("Session renamed to '{}'", session.name);
    Ok(())
}

pub async fn delete_session(pipeline: &StoryPipeline, id: &str) -> Result<()> {
    pipeline.delete_session(id).await?;
    println!("Session {id} deleted");
    Ok(())
}
