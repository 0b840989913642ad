use std::env;

use anyhow::Context;
use encyclopedia_rag::client::RemoteRagClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let question = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("usage: ask <question>");
    }

    let endpoint = env::var("RAG_ENDPOINT_URL").unwrap_or_default();
    let client = RemoteRagClient::new(&endpoint)?;

    let answer = client
        .ask(&question)
        .await
        .with_context(|| format!("asking {}", client.endpoint()))?;

    println!("{}", answer);
    Ok(())
}
