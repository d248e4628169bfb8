use anyhow::{Context, Result};
use quarry_menubar::{client::QuarryApi, util::describe_size};

use super::AppContext;

pub async fn show_status(ctx: &AppContext) -> Result<()> {
    let client = ctx.client()?;
    let health = client.health().await.context("Health check failed")?;
    let status = client.status().await.context("Failed to fetch status")?;

    println!("\nquarry status ({}):", ctx.database);
    println!("==================");
    println!("Health: {} (up {:.0}s)", health.status, health.uptime_seconds);
    println!("Database path: {}", status.database_path);
    println!(
        "Database size: {}",
        describe_size(status.database_size_bytes)
    );
    println!("Documents: {}", status.document_count);
    println!("Collections: {}", status.collection_count);
    println!("Chunks: {}", status.chunk_count);
    println!(
        "Embedding model: {} ({} dimensions)",
        status.embedding_model, status.embedding_dimension
    );
    Ok(())
}

pub async fn list_documents(ctx: &AppContext, collection: Option<&str>) -> Result<()> {
    let client = ctx.client()?;
    let response = client
        .documents(collection)
        .await
        .context("Failed to list documents")?;

    println!("{} documents", response.total_documents);
    for doc in &response.documents {
        println!(
            "  {} [{}] {}/{} pages, {} chunks",
            doc.document_name, doc.collection, doc.indexed_pages, doc.total_pages, doc.chunk_count
        );
    }
    Ok(())
}

pub async fn list_collections(ctx: &AppContext) -> Result<()> {
    let client = ctx.client()?;
    let response = client
        .collections()
        .await
        .context("Failed to list collections")?;

    println!("{} collections", response.total_collections);
    for c in &response.collections {
        println!(
            "  {}: {} documents, {} chunks",
            c.collection, c.document_count, c.chunk_count
        );
    }
    Ok(())
}
