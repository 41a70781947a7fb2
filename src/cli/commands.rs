use serde_json::{json, Map, Value};

use crate::app::{AppContext, MontageError, Result};
use crate::config::plan::build_page;
use crate::config::FragmentPlan;
use crate::domain::{Content, Parameters};
use crate::fragment::{Page, PageResult};
use crate::tracer::Tracer;

pub async fn fetch_page(ctx: &AppContext, params: &[String], as_json: bool) -> Result<()> {
    let page = build_page(ctx, &ctx.config.page)?;

    if page.positions().is_empty() {
        println!("No fragments configured");
        return Ok(());
    }

    let parameters = parse_params(params)?;
    let tracer = if ctx.config.log_trace_events {
        Tracer::logging()
    } else {
        Tracer::new()
    };

    let result = page.fetch_traced(&parameters, tracer).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&render_json(&page, &result))?);
        return Ok(());
    }

    for position in page.positions() {
        let content = result.contents.get(position);
        println!("[{}] {:?}", position, content.availability());
        if content.is_available() {
            println!("{}", content.body());
        }
    }

    let stats = &result.statistics;
    println!(
        "\nFetched in {}ms: {} requested, {} non-empty, {} empty, {} errors, {} fallbacks",
        stats.runtime_millis,
        stats.num_requested,
        stats.num_non_empty,
        stats.num_empty,
        stats.num_errors,
        stats.num_fallbacks_requested
    );
    if let Some(slowest) = &stats.slowest_fragment {
        println!("Slowest: {} ({}ms)", slowest, stats.slowest_non_empty_millis);
    }

    Ok(())
}

pub fn check_plan(ctx: &AppContext) -> Result<()> {
    let page = build_page(ctx, &ctx.config.page)?;

    for fragment in &ctx.config.page.fragments {
        print_plan(fragment, 0);
    }

    println!(
        "Plan OK: {} fragments, {} positions, {} workers",
        ctx.config.page.fragments.len(),
        page.positions().len(),
        page.workers()
    );
    Ok(())
}

fn print_plan(plan: &FragmentPlan, depth: usize) {
    println!(
        "{}{} ({:?} via {}, {} urls{})",
        "  ".repeat(depth),
        plan.position,
        plan.strategy,
        plan.client,
        plan.urls.len(),
        if plan.fallback.is_some() { ", fallback" } else { "" }
    );

    if let Some(continuation) = &plan.continuation {
        for nested in &continuation.fragments {
            print_plan(nested, depth + 1);
        }
    }
}

/// Parse `key=value` arguments into page parameters.
pub fn parse_params(params: &[String]) -> Result<Parameters> {
    params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    MontageError::Config(format!("Expected key=value, got '{}'", param))
                })
        })
        .collect()
}

fn render_json(page: &Page, result: &PageResult) -> Value {
    let mut contents = Map::new();
    for position in page.positions() {
        let content = result.contents.get(position);
        contents.insert(position.to_string(), render_content(&content));
    }

    json!({
        "contents": contents,
        "statistics": result.statistics,
    })
}

fn render_content(content: &Content) -> Value {
    json!({
        "source": content.source(),
        "availability": content.availability(),
        "body": content.body(),
    })
}
