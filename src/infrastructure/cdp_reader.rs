//! PageReader 的 CDP 实现 - 基础设施层
//!
//! 通过页面内 JS 读取/操作目标 UI，并把文本解析为领域值。
//! 所有 fetch 都带 credentials: 'include'，复用浏览器侧的登录态。

use crate::error::AutoError;
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::page_reader::PageReader;
use crate::infrastructure::selectors;
use crate::models::billing::ParseError;
use crate::models::{
    parse_amount_cents, parse_ui_date, AuthorizationWindow, BillingRequest, ContactInfo,
    ExistingEntry, PagerWindow, RowHandle,
};
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// 基于 CDP 的页面读取器
///
/// 持有 Browser 以保持连接存活；JsExecutor 持有 page。
pub struct CdpPageReader {
    _browser: chromiumoxide::Browser,
    executor: JsExecutor,
    list_url: String,
}

impl CdpPageReader {
    pub fn new(
        browser: chromiumoxide::Browser,
        executor: JsExecutor,
        list_url: impl Into<String>,
    ) -> Self {
        Self {
            _browser: browser,
            executor,
            list_url: list_url.into(),
        }
    }

    /// 读取某个选择器的文本内容（元素不存在返回 None）
    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el ? el.textContent.trim() : null;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        let value = self.executor.eval(js_code).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    /// 点击某个选择器，返回是否点到了元素
    async fn click(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el || el.disabled) return false;
                el.click();
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        self.executor.eval_bool(js_code).await
    }

    /// 某个选择器的元素是否存在
    async fn present(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.executor.eval_bool(js_code).await
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    index: usize,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    von: String,
    bis: String,
    betrag: String,
}

#[derive(Debug, Deserialize)]
struct RawContact {
    name: Option<String>,
    file_number: Option<String>,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FetchResult {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl PageReader for CdpPageReader {
    async fn pager_window(&self) -> Result<Option<PagerWindow>> {
        let Some(label) = self.text_of(selectors::PAGER_LABEL).await? else {
            return Ok(None);
        };

        // 形如 "1–10 von 234"，也兼容 "1-10 / 234"
        let re = Regex::new(r"(\d+)\s*[–-]\s*(\d+)\s*(?:von|/)\s*(\d+)")?;
        let caps = re
            .captures(&label)
            .ok_or_else(|| AutoError::from(ParseError::PagerLabel(label.clone())))?;
        let window = PagerWindow::new(caps[1].parse()?, caps[2].parse()?, caps[3].parse()?);

        if !window.is_valid() {
            return Err(AutoError::from(ParseError::PagerLabel(label)).into());
        }
        Ok(Some(window))
    }

    async fn pager_next(&self) -> Result<()> {
        if !self.click(selectors::PAGER_NEXT).await? {
            return Err(AutoError::element_not_found("下一页按钮").into());
        }
        Ok(())
    }

    async fn pager_previous(&self) -> Result<()> {
        if !self.click(selectors::PAGER_PREV).await? {
            return Err(AutoError::element_not_found("上一页按钮").into());
        }
        Ok(())
    }

    async fn visible_rows(&self) -> Result<Vec<RowHandle>> {
        let js_code = format!(
            r#"
            (() => {{
                const rows = document.querySelectorAll({});
                return Array.from(rows).map((row, index) => {{
                    const cell = row.querySelector({});
                    return {{ index: index, name: cell ? cell.textContent.trim() : "" }};
                }});
            }})()
            "#,
            serde_json::to_string(selectors::LIST_ROW)?,
            serde_json::to_string(selectors::ROW_NAME)?
        );
        let raw: Vec<RawRow> = self.executor.eval_as(js_code).await?;
        Ok(raw
            .into_iter()
            .map(|r| RowHandle {
                index: r.index,
                name: r.name,
            })
            .collect())
    }

    async fn open_row(&self, row: &RowHandle) -> Result<()> {
        let js_code = format!(
            r#"
            (() => {{
                const rows = document.querySelectorAll({});
                if (rows.length <= {}) return false;
                rows[{}].click();
                return true;
            }})()
            "#,
            serde_json::to_string(selectors::LIST_ROW)?,
            row.index,
            row.index
        );
        if !self.executor.eval_bool(js_code).await? {
            return Err(
                AutoError::element_not_found(format!("列表行 #{} ({})", row.index, row.name))
                    .into(),
            );
        }
        Ok(())
    }

    async fn list_present(&self) -> Result<bool> {
        self.present(selectors::LIST_CONTAINER).await
    }

    async fn detail_marker_present(&self) -> Result<bool> {
        self.present(selectors::DETAIL_MARKER).await
    }

    async fn scrape_contact(&self) -> Result<ContactInfo> {
        let js_code = format!(
            r#"
            (() => {{
                const text = (sel) => {{
                    const el = document.querySelector(sel);
                    return el ? el.textContent.trim() : null;
                }};
                return {{
                    name: text({}),
                    file_number: text({}),
                    address: text({}),
                    phone: text({})
                }};
            }})()
            "#,
            serde_json::to_string(selectors::CONTACT_NAME)?,
            serde_json::to_string(selectors::CONTACT_FILE_NUMBER)?,
            serde_json::to_string(selectors::CONTACT_ADDRESS)?,
            serde_json::to_string(selectors::CONTACT_PHONE)?
        );
        let raw: RawContact = self.executor.eval_as(js_code).await?;

        let name = raw
            .name
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AutoError::element_not_found("联系数据: 姓名"))?;
        Ok(ContactInfo {
            name,
            file_number: raw.file_number.unwrap_or_default(),
            address: raw.address.unwrap_or_default(),
            phone: raw.phone.filter(|s| !s.is_empty()),
        })
    }

    async fn needs_attestation(&self) -> Result<bool> {
        self.present(selectors::SIGNATURE_FLAG).await
    }

    async fn upload_document(&self, file_name: &str, content: &[u8]) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let js_code = format!(
            r#"
            (async () => {{
                try {{
                    const bytes = Uint8Array.from(atob({}), c => c.charCodeAt(0));
                    const form = new FormData();
                    form.append('datei', new Blob([bytes], {{ type: 'application/pdf' }}), {});
                    const response = await fetch({}, {{
                        method: 'POST',
                        credentials: 'include',
                        body: form
                    }});
                    return {{ ok: response.ok, status: response.status }};
                }} catch (error) {{
                    return {{ error: error.message }};
                }}
            }})()
            "#,
            serde_json::to_string(&encoded)?,
            serde_json::to_string(file_name)?,
            serde_json::to_string(selectors::UPLOAD_ENDPOINT)?
        );

        debug!("上传凭证文书: {} ({} 字节)", file_name, content.len());
        let result: FetchResult = self.executor.eval_as(js_code).await?;
        if let Some(error) = result.error {
            return Err(AutoError::network(format!("上传失败: {}", error)).into());
        }
        if !result.ok {
            return Err(
                AutoError::network(format!("上传返回状态 {:?}", result.status)).into(),
            );
        }
        Ok(())
    }

    async fn authorization_window(&self) -> Result<AuthorizationWindow> {
        let opened = self
            .text_of(selectors::AUTH_OPENED)
            .await?
            .ok_or_else(|| AutoError::element_not_found("授权窗口: 起始日"))?;
        let end = self
            .text_of(selectors::AUTH_END)
            .await?
            .ok_or_else(|| AutoError::element_not_found("授权窗口: 截止日"))?;
        let max_amount = self
            .text_of(selectors::AUTH_MAX_AMOUNT)
            .await?
            .ok_or_else(|| AutoError::element_not_found("授权窗口: 金额上限"))?;

        Ok(AuthorizationWindow {
            opened: parse_ui_date(&opened).map_err(AutoError::from)?,
            authorized_end: parse_ui_date(&end).map_err(AutoError::from)?,
            max_amount_cents: parse_amount_cents(&max_amount).map_err(AutoError::from)?,
        })
    }

    async fn existing_entries(&self) -> Result<Vec<ExistingEntry>> {
        let js_code = format!(
            r#"
            (() => {{
                const text = (row, sel) => {{
                    const el = row.querySelector(sel);
                    return el ? el.textContent.trim() : "";
                }};
                const rows = document.querySelectorAll({});
                return Array.from(rows).map(row => ({{
                    von: text(row, {}),
                    bis: text(row, {}),
                    betrag: text(row, {})
                }}));
            }})()
            "#,
            serde_json::to_string(selectors::ENTRY_ROW)?,
            serde_json::to_string(selectors::ENTRY_START)?,
            serde_json::to_string(selectors::ENTRY_END)?,
            serde_json::to_string(selectors::ENTRY_AMOUNT)?
        );
        let raw: Vec<RawEntry> = self.executor.eval_as(js_code).await?;

        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            entries.push(ExistingEntry {
                start: parse_ui_date(&entry.von).map_err(AutoError::from)?,
                end: parse_ui_date(&entry.bis).map_err(AutoError::from)?,
                amount_cents: parse_amount_cents(&entry.betrag).map_err(AutoError::from)?,
            });
        }
        Ok(entries)
    }

    async fn submit_billing(&self, request: &BillingRequest) -> Result<()> {
        let payload = serde_json::json!({
            "beginn": request.start.format("%Y-%m-%d").to_string(),
            "ende": request.end.format("%Y-%m-%d").to_string(),
            "betragCents": request.amount_cents,
            "nachweis": request.proof_reference,
        });
        let js_code = format!(
            r#"
            (async () => {{
                try {{
                    const response = await fetch({}, {{
                        method: 'POST',
                        headers: {{
                            'Content-Type': 'application/json',
                            'Accept': 'application/json, text/plain, */*'
                        }},
                        credentials: 'include',
                        body: JSON.stringify({})
                    }});
                    return {{ ok: response.ok, status: response.status }};
                }} catch (error) {{
                    return {{ error: error.message }};
                }}
            }})()
            "#,
            serde_json::to_string(selectors::BILLING_SAVE_ENDPOINT)?,
            payload
        );

        debug!("提交账单记录: {:?}", request);
        let result: FetchResult = self.executor.eval_as(js_code).await?;
        if let Some(error) = result.error {
            return Err(AutoError::network(format!("账单提交失败: {}", error)).into());
        }
        if !result.ok {
            return Err(
                AutoError::network(format!("账单提交返回状态 {:?}", result.status)).into(),
            );
        }
        Ok(())
    }

    async fn back_to_list(&self) -> Result<()> {
        if !self.click(selectors::BACK_BUTTON).await? {
            return Err(AutoError::element_not_found("返回列表按钮").into());
        }
        Ok(())
    }

    async fn goto_list(&self) -> Result<()> {
        self.executor.goto(&self.list_url).await
    }

    async fn reload(&self) -> Result<()> {
        // 通过重新导航实现刷新，避免依赖导航中的执行上下文
        let url = self.executor.current_url().await?;
        let target = if url.is_empty() { &self.list_url } else { &url };
        self.executor.goto(target).await
    }
}
