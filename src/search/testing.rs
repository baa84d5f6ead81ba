//! Provider doubles for the search unit tests.
//!
//! `EchoEmbedder` encodes the query text byte-for-byte into the vector, so
//! `ScriptedIndex` can recover the text and answer from a script keyed on it.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::index::VectorIndex;
use crate::llm::completion::{ChatMessage, TextGenerator};
use crate::llm::embeddings::Embedder;
use crate::models::{IndexMatch, Metadata};
use crate::search::Providers;

pub struct EchoEmbedder {
    pub fail: bool,
}

#[async_trait]
impl Embedder for EchoEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            anyhow::bail!("embedding provider unavailable");
        }
        Ok(text.bytes().map(f32::from).collect())
    }
}

fn decode(vector: &[f32]) -> String {
    String::from_utf8(vector.iter().map(|v| *v as u8).collect()).unwrap()
}

#[derive(Default)]
pub struct ScriptedIndex {
    script: HashMap<String, Vec<IndexMatch>>,
    failing: Vec<String>,
    /// Every (query text, top_k) received, in call order
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedIndex {
    pub fn answer(mut self, text: &str, matches: Vec<IndexMatch>) -> Self {
        self.script.insert(text.to_string(), matches);
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    pub fn queried(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let text = decode(vector);
        self.calls.lock().unwrap().push((text.clone(), top_k));
        if self.failing.contains(&text) {
            anyhow::bail!("index unavailable for '{text}'");
        }
        let mut matches = self.script.get(&text).cloned().unwrap_or_default();
        matches.truncate(top_k);
        Ok(matches)
    }
}

pub struct FixedGenerator {
    /// `None` makes every call fail
    pub reply: Option<String>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FixedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => anyhow::bail!("completion provider unavailable"),
        }
    }
}

pub fn meta(value: Value) -> Metadata {
    value.as_object().cloned().unwrap_or_default()
}

pub fn hit(id: &str, score: f32, metadata: Value) -> IndexMatch {
    IndexMatch {
        id: id.to_string(),
        score,
        metadata: meta(metadata),
    }
}

pub fn providers(
    generator: FixedGenerator,
    products: ScriptedIndex,
    brands: ScriptedIndex,
) -> (Providers, Arc<ScriptedIndex>, Arc<ScriptedIndex>) {
    let products = Arc::new(products);
    let brands = Arc::new(brands);
    let providers = Providers {
        embedder: Arc::new(EchoEmbedder { fail: false }),
        generator: Arc::new(generator),
        products: products.clone(),
        brands: brands.clone(),
    };
    (providers, products, brands)
}
