//! 凭证文书生成 - 业务能力层
//!
//! 文书内容（PDF）由独立后端生成，本服务只负责调用后端拿到字节，
//! 上传由调用方通过 PageReader 完成。

use crate::error::AutoError;
use crate::models::{ContactInfo, DateRange};
use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

/// 生成好的凭证文书
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub content: Vec<u8>,
    /// 账单记录中引用该文书的编号
    pub reference: String,
}

pub struct DocumentService {
    client: reqwest::Client,
    backend_url: String,
}

impl DocumentService {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend_url: backend_url.into(),
        }
    }

    /// 调用后端生成凭证文书
    pub async fn generate(&self, contact: &ContactInfo, range: DateRange) -> Result<GeneratedDocument> {
        let endpoint = format!("{}/api/nachweis/generate", self.backend_url);
        let payload = json!({
            "name": contact.name,
            "aktenzeichen": contact.file_number,
            "anschrift": contact.address,
            "telefon": contact.phone,
            "von": range.start.format("%Y-%m-%d").to_string(),
            "bis": range.end.format("%Y-%m-%d").to_string(),
        });

        debug!("请求文书生成: {}", endpoint);
        let response = self
            .client
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(AutoError::from)?;

        if !response.status().is_success() {
            return Err(AutoError::network(format!(
                "文书生成后端返回状态 {}",
                response.status()
            ))
            .into());
        }

        let content = response.bytes().await.map_err(AutoError::from)?.to_vec();
        if content.is_empty() {
            return Err(AutoError::network("文书生成后端返回空内容").into());
        }

        let reference = format!(
            "NW-{}-{}-{}",
            contact.file_number,
            range.start.format("%Y%m%d"),
            range.end.format("%Y%m%d")
        );
        let file_name = format!("{}.pdf", reference);

        info!("✓ 文书已生成: {} ({} 字节)", file_name, content.len());
        Ok(GeneratedDocument {
            file_name,
            content,
            reference,
        })
    }
}
