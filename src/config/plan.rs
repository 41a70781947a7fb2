//! Declarative page plans.
//!
//! A plan lists the fragments of a page, how their providers are combined
//! and which client fetches them. [`build_page`] turns it into a runnable
//! [`Page`].

use serde::Deserialize;
use serde_json::Value;

use crate::app::{AppContext, MontageError, Result};
use crate::config::DEFAULT_CLIENT;
use crate::domain::{Content, Parameters};
use crate::fragment::{fragment, Fragment, Page};
use crate::provider::{quickest_of, with_all, with_first, SharedProvider};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PagePlan {
    pub fragments: Vec<FragmentPlan>,
}

/// How the providers of a fragment are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Exactly one URL
    #[default]
    Single,
    /// Race all URLs, first available answer wins
    Quickest,
    /// First available answer in URL order
    First,
    /// Every available answer, merged in URL order
    All,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FragmentPlan {
    pub position: String,

    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default = "default_client")]
    pub client: String,

    /// URL templates, expanded with the page parameters
    pub urls: Vec<String>,

    /// Accepted media type (default: text/html)
    #[serde(default)]
    pub accept: Option<String>,

    /// Static text shown when the backend cannot answer
    #[serde(default)]
    pub fallback: Option<String>,

    #[serde(default)]
    pub continuation: Option<ContinuationPlan>,
}

/// Nested fragments fed with a value taken from the first content.
#[derive(Debug, Clone, Deserialize)]
pub struct ContinuationPlan {
    /// Name of the parameter the nested fragments see
    pub parameter: String,

    /// JSON pointer into the first body; the trimmed body is used without one
    #[serde(default)]
    pub json_pointer: Option<String>,

    pub fragments: Vec<FragmentPlan>,
}

fn default_client() -> String {
    DEFAULT_CLIENT.to_string()
}

/// Build a runnable page from `plan` using the clients of `ctx`.
pub fn build_page(ctx: &AppContext, plan: &PagePlan) -> Result<Page> {
    let fragments = plan
        .fragments
        .iter()
        .map(|fragment_plan| build_fragment(ctx, fragment_plan))
        .collect::<Result<Vec<_>>>()?;

    Ok(ctx.page(fragments))
}

fn build_fragment(ctx: &AppContext, plan: &FragmentPlan) -> Result<Fragment> {
    let single = fragment(plan.position.as_str(), build_provider(ctx, plan)?);

    let Some(continuation) = &plan.continuation else {
        return Ok(single);
    };

    let nested = continuation
        .fragments
        .iter()
        .map(|nested_plan| build_fragment(ctx, nested_plan))
        .collect::<Result<Vec<_>>>()?;

    let parameter = continuation.parameter.clone();
    let pointer = continuation.json_pointer.clone();
    single.followed_by(
        move |content: &Content| extract_parameter(content, &parameter, pointer.as_deref()),
        nested,
    )
}

fn build_provider(ctx: &AppContext, plan: &FragmentPlan) -> Result<SharedProvider> {
    if plan.urls.is_empty() {
        return Err(MontageError::Config(format!(
            "fragment '{}' has no urls",
            plan.position
        )));
    }
    if plan.strategy == Strategy::Single && plan.urls.len() > 1 {
        return Err(MontageError::Config(format!(
            "fragment '{}' has {} urls but strategy 'single'",
            plan.position,
            plan.urls.len()
        )));
    }
    if plan.fallback.is_some() && plan.urls.len() > 1 {
        return Err(MontageError::Config(format!(
            "fragment '{}': a fallback needs exactly one url",
            plan.position
        )));
    }

    let mut providers = Vec::with_capacity(plan.urls.len());
    for url in &plan.urls {
        let mut builder = ctx.content_from(&plan.client, url)?;
        if let Some(accept) = &plan.accept {
            builder = builder.accept(accept.clone());
        }
        if let Some(fallback) = &plan.fallback {
            builder = builder.fallback_text(fallback.clone());
        }
        providers.push(builder.build()?);
    }

    Ok(match plan.strategy {
        Strategy::Single => providers.remove(0),
        Strategy::Quickest => quickest_of(providers),
        Strategy::First => with_first(providers),
        Strategy::All => with_all(providers),
    })
}

fn extract_parameter(content: &Content, parameter: &str, pointer: Option<&str>) -> Parameters {
    let value = match pointer {
        None => Some(Value::String(content.body().trim().to_string())),
        Some(pointer) => match serde_json::from_str::<Value>(content.body()) {
            Ok(json) => json.pointer(pointer).cloned(),
            Err(e) => {
                tracing::debug!("Body of {} is not JSON: {}", content.position(), e);
                None
            }
        },
    };

    match value {
        Some(value) => Parameters::from_iter([(parameter, value)]),
        None => {
            tracing::debug!(
                "No value for '{}' in content of {}",
                parameter,
                content.position()
            );
            Parameters::empty()
        }
    }
}
