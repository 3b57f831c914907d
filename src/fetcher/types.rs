use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How a page is retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Plain HTTP GET, no JavaScript.
    #[default]
    Static,
    /// Headless browser that executes page scripts.
    Rendered,
}

impl FetchMode {
    pub fn other(self) -> Self {
        match self {
            Self::Static => Self::Rendered,
            Self::Rendered => Self::Static,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
        }
    }

    /// Name used by the on-disk site file (`get` / `js`).
    pub fn crawler_name(self) -> &'static str {
        match self {
            Self::Static => "get",
            Self::Rendered => "js",
        }
    }

    pub fn from_crawler_name(name: &str) -> Option<Self> {
        match name {
            "get" | "static" => Some(Self::Static),
            "js" | "rendered" => Some(Self::Rendered),
            _ => None,
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw HTML together with the mode that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    pub mode: FetchMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gb2312,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else {
            Self::Other(encoding.name().to_string())
        }
    }
}

/// A decoded static response.
#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_raw: Bytes,
    pub body_utf8: String,
    pub charset: Charset,
}
