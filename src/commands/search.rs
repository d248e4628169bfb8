use anyhow::{Context, Result};
use quarry_menubar::{
    client::QuarryApi,
    search::{SearchCoordinator, SearchState},
    types::SearchResult,
    util::{single_line, truncate_str},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::AppContext;

const SNIPPET_LEN: usize = 200;

pub async fn search_once(
    ctx: &AppContext,
    query: &str,
    limit: Option<usize>,
    collection: Option<&str>,
) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query must not be empty");
    }

    info!("Searching '{}' for: {}", ctx.database, query);
    let client = ctx.client()?;
    let limit = limit.unwrap_or(ctx.config.search.result_limit);
    let response = client
        .search(query, limit, collection)
        .await
        .context("Search failed")?;

    if response.results.is_empty() {
        println!("No results for \"{}\"", query);
    } else {
        print_results(&response.results);
    }
    Ok(())
}

/// Feed stdin lines into a [`SearchCoordinator`] and print each new state.
///
/// A blank line clears the search. At end of input the last query is
/// searched immediately and its outcome printed.
pub async fn watch(ctx: &AppContext, collection: Option<String>) -> Result<()> {
    let search = SearchCoordinator::new(Arc::new(ctx.client()?), ctx.config.search.clone());
    search.set_collection(collection);
    let mut states = search.subscribe();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => search.clear(),
                    Some(line) => search.set_query(line),
                    None => break,
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = states.borrow_and_update().clone();
                print_state(&state);
            }
        }
    }

    debug!("End of input, flushing query '{}'", search.query());
    if search.query().trim().is_empty() {
        return Ok(());
    }
    print_state(&search.search_and_wait().await);
    Ok(())
}

fn print_state(state: &SearchState) {
    match state {
        SearchState::Results(results) => print_results(results),
        other => println!("[{}]", other),
    }
}

fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} (p.{}, {}) [{:.3}]",
            i + 1,
            result.document_name,
            result.page_number,
            result.collection,
            result.similarity
        );
        println!("   {}", truncate_str(&single_line(&result.text), SNIPPET_LEN));
    }
}
