//! HTML标签提取器
//! 从页面markup中提取 script-src 与 meta(name -> content)，供模式引擎匹配

use std::cell::RefCell;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// 从markup中提取到的信号
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkupSignals {
    pub script_srcs: Vec<String>,
    pub meta_tags: Vec<(String, String)>,
}

/// 分词回调：只关心开始标签
#[derive(Default)]
struct SignalSink {
    signals: RefCell<MarkupSignals>,
}

impl TokenSink for SignalSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => self.push_script_src(&attrs),
                "meta" => self.push_meta(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl SignalSink {
    fn push_script_src(&self, attrs: &[Attribute]) {
        if let Some(src) = attrs.iter().find(|attr| attr.name.local.as_ref() == "src") {
            self.signals.borrow_mut().script_srcs.push(src.value.to_string());
        }
    }

    fn push_meta(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" | "property" => name = Some(attr.value.to_string().to_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        if let (Some(n), Some(c)) = (name, content) {
            self.signals.borrow_mut().meta_tags.push((n, c));
        }
    }
}

/// HTML提取器
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// 从HTML字符串提取标签
    pub fn extract(html: &str) -> MarkupSignals {
        let tokenizer = Tokenizer::new(SignalSink::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.signals.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="Generator" content="WordPress 6.0" />
            <meta property="og:site_name" content="Demo">
            <meta charset="utf-8">
            <script>inline()</script>
        "#;

        let signals = HtmlExtractor::extract(html);

        assert_eq!(signals.script_srcs, vec!["/jquery.min.js".to_string()]);
        assert_eq!(
            signals.meta_tags,
            vec![
                ("generator".to_string(), "WordPress 6.0".to_string()),
                ("og:site_name".to_string(), "Demo".to_string()),
            ]
        );
    }
}
