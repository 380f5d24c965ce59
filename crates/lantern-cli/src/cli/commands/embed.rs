use lantern_embeddings::{build_embedder, EmbedError, EmbeddingsConfig};
use serde_json::json;

use crate::cli::args::EmbedArgs;
use crate::exit_codes;

pub async fn run(args: EmbedArgs) -> anyhow::Result<i32> {
    match embed(&args).await {
        Ok(output) => {
            println!("{}", serde_json::to_string(&output)?);
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("✖ Embedding failed: {}", e);
            Ok(e.exit_code())
        }
    }
}

async fn embed(args: &EmbedArgs) -> Result<serde_json::Value, EmbedError> {
    let mut config = match &args.config {
        Some(path) => EmbeddingsConfig::load(path)?,
        None => EmbeddingsConfig::from_env(),
    };
    if let Some(provider) = &args.provider {
        config.provider = provider.clone();
    }
    if args.query && args.texts.len() != 1 {
        return Err(EmbedError::Config {
            message: format!("--query takes exactly one text, got {}", args.texts.len()),
        });
    }

    let embedder = build_embedder(&config)?;
    let mut output = json!({
        "provider": embedder.name(),
        "model": embedder.model_id(),
    });
    if args.query {
        let vector = embedder.embed_query(&args.texts[0]).await?;
        output["embedding"] = json!(vector);
    } else {
        let vectors = embedder.embed_documents(&args.texts).await?;
        output["embeddings"] = json!(vectors);
    }
    Ok(output)
}
