//! 站点页面结构：选择器与页面脚本

use url::Url;

// ========== 选择器 ==========

/// 列表中的操作链接，出现即表示列表可交互
pub const SEL_ROW_ACTIONS: &str = ".operate a";
pub const SEL_NEXT_PAGE: &str = ".ui-pager-next";
pub const SEL_PAGE_INPUT: &str = "#page";

pub const SEL_DETAIL_CORE: &str = ".invoice-detail";
pub const SEL_DOWNLOAD_TRIGGER: &str = ".download-trigger";

pub const SEL_DIALOG: &str = ".ui-dialog";
pub const SEL_DIALOG_CONFIRM: &str = ".ui-dialog .ui-dialog-btn-submit, .ui-dialog .btn-ok";

pub const SEL_TITLE_TYPE: &str = "select#ivcTitleType";
pub const SEL_CONTENT_TYPE: &str = "#ivcContentSpan100";
pub const SEL_COMPANY_INPUT: &str = "input#company";
pub const SEL_TAX_NO_INPUT: &str = "input#taxNo";
pub const SEL_REISSUE_SUBMIT: &str = ".invoice-main .form.mt10:last-child a:first-child";

/// 换开表单中"单位"抬头类型的取值
pub const TITLE_TYPE_ENTERPRISE: &str = "5";

/// 登录二维码所在域名
pub const QR_HOST: &str = "qr.m.jd.com";

// ========== 页面脚本 ==========

/// 读取当前页所有订单行
///
/// 订单号与 tbody 按下标配对，保持文档顺序
pub const ROWS_SCRIPT: &str = r#"
(() => {
    const numbers = Array.from(document.querySelectorAll('.order-tb .tr-th .number'))
        .map(el => el.innerText);
    const bodies = Array.from(document.querySelectorAll('.order-tb tbody'));
    return numbers.map((label, i) => {
        const body = bodies[i];
        if (!body) {
            return { numberLabel: label, statusText: '', links: [] };
        }
        const cell = body.querySelector('td:nth-child(3)') || body.querySelector('td:nth-child(2)');
        const links = Array.from(body.querySelectorAll('.operate a'))
            .map(a => ({ text: a.innerText.trim(), href: a.href || null }));
        return { numberLabel: label, statusText: cell ? cell.innerText : '', links };
    });
})()
"#;

pub const PAGE_LABEL_SCRIPT: &str = r#"
(() => {
    const el = document.querySelector('.ui-page-curr');
    return el ? el.innerText.trim() : null;
})()
"#;

/// 详情页快照：抬头、全文、操作区文本
pub const DETAIL_SNAPSHOT_SCRIPT: &str = r#"
(() => {
    const payeeCell = document.querySelector(
        '.invoice-detail .tb-void:nth-child(2) tr:nth-child(3) td:nth-child(2)'
    );
    const actionLabels = Array.from(document.querySelectorAll('.invoice-detail a, .invoice-detail button'))
        .map(el => el.innerText.trim())
        .filter(text => text.length > 0);
    return {
        payee: payeeCell ? payeeCell.innerText.trim() : null,
        bodyText: document.body ? document.body.innerText : '',
        actionLabels
    };
})()
"#;

/// 找到含"发票抬头"的标签单元格，取相邻单元格文本
pub const PAYEE_TITLE_SCRIPT: &str = r#"
(() => {
    const labelSpan = Array.from(document.querySelectorAll('td.label span'))
        .find(span => span.textContent.includes('发票抬头'));
    if (!labelSpan) return null;
    const valueTd = labelSpan.parentNode && labelSpan.parentNode.nextElementSibling;
    return valueTd ? valueTd.textContent.trim() : null;
})()
"#;

pub const DOWNLOAD_HREF_SCRIPT: &str = r#"
(() => {
    const el = document.querySelector('.download-trigger');
    return el && el.href ? el.href : null;
})()
"#;

/// 可见对话框的文本
pub const DIALOG_TEXT_SCRIPT: &str = r#"
(() => {
    const dialog = Array.from(document.querySelectorAll('.ui-dialog'))
        .find(el => el.offsetParent !== null);
    return dialog ? dialog.innerText.trim() : null;
})()
"#;

/// 判断选择器是否存在
pub fn exists_script(selector: &str) -> String {
    format!(
        "!!document.querySelector({})",
        serde_json::Value::String(selector.to_string())
    )
}

/// 点击第 `position` 行的换开链接（没有"换开"文字时点第一个操作链接）
pub fn click_reissue_script(position: usize) -> String {
    format!(
        r#"
(() => {{
    const body = document.querySelectorAll('.order-tb tbody')[{position}];
    if (!body) return false;
    const links = Array.from(body.querySelectorAll('.operate a'));
    const target = links.find(a => a.innerText.includes('换开')) || links[0];
    if (!target) return false;
    target.click();
    return true;
}})()
"#
    )
}

/// 设置页码并提交分页表单
pub fn jump_page_script(page_no: u32) -> String {
    format!(
        r#"
(() => {{
    const input = document.getElementById('page');
    const form = document.getElementById('indexForm');
    if (!input || !form) return false;
    input.value = '{page_no}';
    form.submit();
    return true;
}})()
"#
    )
}

/// 设置下拉框取值并触发 change
pub fn select_value_script(selector: &str, value: &str) -> String {
    format!(
        r#"
(() => {{
    const el = document.querySelector({selector});
    if (!el) return false;
    el.value = {value};
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return el.value === {value};
}})()
"#,
        selector = serde_json::Value::String(selector.to_string()),
        value = serde_json::Value::String(value.to_string()),
    )
}

/// 登录二维码响应：`qr.m.jd.com` 且带 `t` 参数
pub fn is_qr_challenge_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let on_qr_host = parsed
        .host_str()
        .map(|h| h == QR_HOST || h.ends_with(&format!(".{}", QR_HOST)))
        .unwrap_or(false);
    on_qr_host && parsed.query_pairs().any(|(k, v)| k == "t" && !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_qr_response() {
        assert!(is_qr_challenge_url(
            "https://qr.m.jd.com/show?appid=133&size=147&t=1700000000000"
        ));
        assert!(!is_qr_challenge_url("https://qr.m.jd.com/show?appid=133"));
        assert!(!is_qr_challenge_url("https://passport.jd.com/new/login.aspx?t=1"));
        assert!(!is_qr_challenge_url("not a url"));
    }

    #[test]
    fn scripts_quote_selectors() {
        assert_eq!(
            exists_script(".ui-dialog"),
            r#"!!document.querySelector(".ui-dialog")"#
        );
        let script = select_value_script(SEL_TITLE_TYPE, TITLE_TYPE_ENTERPRISE);
        assert!(script.contains(r#"document.querySelector("select#ivcTitleType")"#));
        assert!(script.contains(r#"el.value = "5";"#));
    }

    #[test]
    fn row_scripts_embed_numbers() {
        assert!(click_reissue_script(4).contains("tbody')[4]"));
        assert!(jump_page_script(7).contains("input.value = '7';"));
    }
}
