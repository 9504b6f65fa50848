use anyhow::{Context, Result};
use std::path::Path;

use storyground::physics::analyze_physics;
use storyground::pipeline::StoryPipeline;

async fn read_story(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read story file: {}", path.display()))
}

pub async fn analyze(pipeline: &StoryPipeline, story_file: &Path, session: Option<String>) -> Result<()> {
    let story = read_story(story_file).await?;

    let session_id = match session {
        Some(id) => id,
        None => {
            let session = pipeline.sessions().create().await?;
            println!("Created session {} ({})", session.id, session.name);
            session.id
        }
    };

    let outcome = pipeline.analyze_story(&session_id, &story).await?;

    println!("{}", outcome.summary);
    println!();
    println!("Session: {}", outcome.session_id);
    Ok(())
}

pub async fn physics(story_file: &Path, html: bool) -> Result<()> {
    let story = read_story(story_file).await?;
    let report = analyze_physics(&story);

    if html {
        println!("{}", report.to_html());
    } else {
        println!("{}", report.to_text());
    }
    Ok(())
}
