use serde::ser::{Serialize, SerializeMap, Serializer};

pub const PUBLISHER: &str = "Publisher";
pub const COURSE_FPID: &str = "Course FPID";
pub const QUESTION_BANK_FPID: &str = "Question Bank FPID";
pub const QUIZ_TYPE: &str = "Quiz Type";
pub const LEVEL: &str = "Level";
pub const SUBJECT: &str = "Subject";

/// 标签：名称 + 有序的值列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    values: Vec<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// 用单个值替换全部值
    pub fn reset_to(&mut self, value: impl Into<String>) {
        self.values = vec![value.into()];
    }

    pub fn append(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }
}

/// 按插入顺序保存的标签集合，序列化为 `{name: [values]}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
        self.tags.iter_mut().find(|tag| tag.name == name)
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(Tag::values)
    }

    /// 设置标签为单个值（已存在则替换全部值）
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self.get_mut(name) {
            Some(tag) => tag.reset_to(value),
            None => self.tags.push(Tag::new(name, value)),
        }
    }

    /// 设置标签的全部值（已存在则替换）
    pub fn set_values(&mut self, name: &str, values: Vec<String>) {
        match self.get_mut(name) {
            Some(tag) => tag.values = values,
            None => self.tags.push(Tag::with_values(name, values)),
        }
    }

    /// 追加一个值（标签不存在时新建）
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        match self.get_mut(name) {
            Some(tag) => tag.append(value),
            None => self.tags.push(Tag::new(name, value)),
        }
    }

    /// 用另一组标签覆盖（同名标签整体替换）
    pub fn merge_replace(&mut self, other: &TagSet) {
        for tag in &other.tags {
            self.set_values(&tag.name, tag.values.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.set_values(&tag.name, tag.values);
        }
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tags.len()))?;
        for tag in &self.tags {
            map.serialize_entry(&tag.name, &tag.values)?;
        }
        map.end()
    }
}
