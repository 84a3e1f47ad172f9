use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use shared::domain::ContractRequest;

pub const SOLIDITY_HEADER: &str = "/* SPDX-License-Identifier: MIT */\npragma solidity ^0.8.0;\n\n";

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(rename = "contractTemplate")]
    contract_template: Option<String>,
}

/// Solidity source with `{{field}}` placeholders, read from a JSON file
/// holding a single `contractTemplate` string.
#[derive(Debug, Clone)]
pub struct SolidityTemplate {
    source: String,
}

impl SolidityTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: TemplateFile =
            serde_json::from_str(raw).context("failed to parse contract template JSON")?;
        let source = file
            .contract_template
            .ok_or_else(|| anyhow!("contractTemplate not found in template file"))?;
        Ok(Self::new(source))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read contract template '{}'", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn populate(&self, fields: &ContractRequest) -> String {
        [
            ("{{clientName}}", fields.client_name.as_str()),
            ("{{clientEmail}}", fields.client_email.as_str()),
            ("{{paymentAmount}}", fields.payment_amount.as_str()),
            ("{{requirements}}", fields.requirements.as_str()),
            ("{{description}}", fields.description.as_str()),
        ]
        .into_iter()
        .fold(self.source.clone(), |code, (placeholder, value)| {
            code.replace(placeholder, value)
        })
    }
}

pub fn solidity_file_contents(code: &str) -> String {
    format!("{SOLIDITY_HEADER}{code}")
}

/// Writes `code` behind the license and pragma header, replacing any
/// previous file at `path`.
pub async fn write_solidity_file(code: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    tokio::fs::write(path, solidity_file_contents(code))
        .await
        .with_context(|| format!("failed to write contract to '{}'", path.display()))?;
    Ok(())
}
