//! 回执服务 - 业务能力层
//!
//! 回执 PDF、机器人截图、把截图合成进 PDF，三件事都只处理单个订单。

use std::path::PathBuf;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::models::Order;
use crate::services::artifact_store::ArtifactStore;
use crate::services::site::OrderSite;

/// 已保存的回执
#[derive(Debug, Clone)]
pub struct Receipt {
    /// 回执区域的原始 HTML
    pub html: String,
    /// 回执 PDF 路径
    pub pdf_path: PathBuf,
}

/// 已保存的机器人截图
#[derive(Debug, Clone)]
pub struct RobotScreenshot {
    pub png: Vec<u8>,
    pub path: PathBuf,
}

pub struct ReceiptService {
    store: ArtifactStore,
}

impl ReceiptService {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// 读取回执 HTML 并渲染成 `receipt_<订单号>.pdf`
    pub async fn store_receipt_as_pdf<S: OrderSite + ?Sized>(
        &self,
        site: &S,
        order: &Order,
    ) -> Result<Receipt> {
        let html = site.receipt_html().await?;
        let pdf = site.render_pdf(&receipt_document(&html)).await?;

        let pdf_path = self.store.receipt_path(order);
        self.store.write(&pdf_path, &pdf).await?;
        debug!("回执 PDF: {}", pdf_path.display());

        Ok(Receipt { html, pdf_path })
    }

    /// 截取机器人预览图并保存为 `robot_<订单号>.png`
    pub async fn screenshot_robot<S: OrderSite + ?Sized>(
        &self,
        site: &S,
        order: &Order,
    ) -> Result<RobotScreenshot> {
        let png = site.robot_screenshot().await?;

        let path = self.store.robot_path(order);
        self.store.write(&path, &png).await?;
        debug!("机器人截图: {}", path.display());

        Ok(RobotScreenshot { png, path })
    }

    /// 把截图合成进回执 PDF，原地覆盖回执文件
    pub async fn embed_screenshot_to_receipt<S: OrderSite + ?Sized>(
        &self,
        site: &S,
        receipt: &Receipt,
        screenshot: &RobotScreenshot,
    ) -> Result<()> {
        let document = receipt_with_robot_document(&receipt.html, &screenshot.png);
        let pdf = site.render_pdf(&document).await?;
        self.store.replace(&receipt.pdf_path, &pdf).await
    }
}

const DOCUMENT_STYLE: &str = "body { font-family: sans-serif; margin: 32px; } \
     .robot { margin-top: 24px; text-align: center; } \
     .robot img { max-width: 60%; }";

/// 只包含回执的 HTML 文档
pub fn receipt_document(receipt_html: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>{}</style></head>\
         <body><div id=\"receipt\">{}</div></body></html>",
        DOCUMENT_STYLE, receipt_html
    )
}

/// 回执 + 机器人截图的 HTML 文档，截图以 data URI 内嵌
pub fn receipt_with_robot_document(receipt_html: &str, png: &[u8]) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>{}</style></head>\
         <body><div id=\"receipt\">{}</div>\
         <div class=\"robot\"><img src=\"data:image/png;base64,{}\" alt=\"robot\"></div>\
         </body></html>",
        DOCUMENT_STYLE,
        receipt_html,
        STANDARD.encode(png)
    )
}
