//! Parse command - inspect a capsule URI.

use capsule_core::{CapsuleUri, Params};
use serde::Serialize;

use crate::output::{OutputFormat, print_json};
use crate::theme::Theme;

/// A parsed URI broken into its components.
#[derive(Debug, Serialize)]
pub(crate) struct UriReport {
    uri: String,
    address: String,
    authority: String,
    domain: String,
    subdomains: Vec<String>,
    operation: String,
    version: Option<String>,
    params: Params,
    sovereign: bool,
}

impl From<&CapsuleUri> for UriReport {
    fn from(uri: &CapsuleUri) -> Self {
        Self {
            uri: uri.to_uri(),
            address: uri.address(),
            authority: uri.authority().to_owned(),
            domain: uri.domain().to_owned(),
            subdomains: uri.subdomains().to_vec(),
            operation: uri.operation().to_owned(),
            version: uri.version().map(str::to_owned),
            params: uri.params().clone(),
            sovereign: uri.is_sovereign(),
        }
    }
}

/// Parse `text` and print its components.
pub(crate) fn parse_uri(text: &str, format: OutputFormat) -> anyhow::Result<()> {
    let uri = CapsuleUri::parse(text)?;
    let report = UriReport::from(&uri);

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("\n{}", Theme::header("Capsule URI"));
    println!("{}", Theme::kv("Canonical", &report.uri));
    println!("{}", Theme::kv("Authority", &report.authority));
    println!("{}", Theme::kv("Domain", &report.domain));
    if !report.subdomains.is_empty() {
        println!("{}", Theme::kv("Subdomains", &report.subdomains.join("/")));
    }
    println!("{}", Theme::kv("Operation", &report.operation));
    println!(
        "{}",
        Theme::kv("Version", report.version.as_deref().unwrap_or("-"))
    );
    for (key, value) in &report.params {
        println!("{}", Theme::kv(&format!("?{key}"), value));
    }
    if report.sovereign {
        println!("{}", Theme::info("Resolves against locally installed capsules"));
    }
    println!();
    Ok(())
}
