use crate::models::tags::{Tag, TagSet};
use anyhow::{Context, Result};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tokio::fs;

/// 标签文件中的单个条目：字符串、数字或它们组成的数组
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagValues(Vec<String>);

impl<'de> Deserialize<'de> for TagValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagValuesVisitor;

        impl<'de> Visitor<'de> for TagValuesVisitor {
            type Value = TagValues;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a tag value or an array of tag values")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TagValues(vec![value.to_string()]))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(TagValues(vec![value.to_string()]))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(TagValues(vec![value.to_string()]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<ScalarValue>()? {
                    values.push(value.0);
                }
                Ok(TagValues(values))
            }
        }

        deserializer.deserialize_any(TagValuesVisitor)
    }
}

/// 数组中的元素只允许字符串或整数
struct ScalarValue(String);

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match TagValues::deserialize(deserializer)? {
            TagValues(mut values) if values.len() == 1 => Ok(ScalarValue(values.remove(0))),
            _ => Err(de::Error::custom("nested arrays are not allowed in tag values")),
        }
    }
}

/// 解析 JSON 标签文本：`{"标签名": "值" | ["值", ...]}`
///
/// 同名标签只会出现一次，输出按标签名排序。
pub fn parse_tags(content: &str) -> Result<TagSet> {
    let raw: BTreeMap<String, TagValues> =
        serde_json::from_str(content).context("标签文件必须是 {名称: 值或值数组} 形式的 JSON 对象")?;
    Ok(raw
        .into_iter()
        .map(|(name, TagValues(values))| Tag::with_values(name, values))
        .collect())
}

/// 从 JSON 文件加载补充标签
pub async fn load_tags_file(path: &Path) -> Result<TagSet> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取标签文件: {}", path.display()))?;

    let tags = parse_tags(&content).with_context(|| format!("无法解析标签文件: {}", path.display()))?;
    tracing::info!("成功加载 {} 个标签: {}", tags.len(), path.display());
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn accepts_scalars_and_arrays() {
        let tags = parse_tags(r#"{"Topic": ["ownership", "borrowing"], "Level": 2, "Series": "Rust"}"#).unwrap();
        assert_eq!(tags.values("Topic").unwrap(), ["ownership", "borrowing"]);
        assert_eq!(tags.values("Level").unwrap(), ["2"]);
        assert_eq!(tags.values("Series").unwrap(), ["Rust"]);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(parse_tags(r#"["a", "b"]"#).is_err());
        assert!(parse_tags(r#"{"Topic": [["nested"]]}"#).is_err());
        assert!(parse_tags(r#"{"Topic": {"a": 1}}"#).is_err());
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Topic": "traits"}}"#).unwrap();
        let tags = load_tags_file(file.path()).await.unwrap();
        assert_eq!(tags.values("Topic").unwrap(), ["traits"]);
    }
}
