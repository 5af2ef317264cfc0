use serde::Serialize;

/// Named block of a rendered reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
}

/// Rendered response the gateway sends back to the chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ReplyField>,
    /// Visible to the caller only
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// "1 token" / "2 tokens"
pub fn tokens(count: impl Into<u64>) -> String {
    let count = count.into();
    if count == 1 {
        "1 token".to_string()
    } else {
        format!("{} tokens", count)
    }
}
