//! 流水线消息：信息单元（IU）与更新消息
//!
//! 每个 IU 带唯一 id、创建者、内容与 grounded_in（指向产生它的上游 IU），
//! UpdateMessage 是有序的 (IU, UpdateType) 列表。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 信息单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationUnit {
    pub id: Uuid,
    /// 产生该单元的模块名
    pub creator: String,
    pub payload: String,
    /// 来源单元（用于下游关联输出与输入）
    pub grounded_in: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl InformationUnit {
    pub fn new(creator: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator: creator.into(),
            payload: payload.into(),
            grounded_in: None,
            created_at: Utc::now(),
        }
    }

    /// 创建以 source 为来源的新单元
    pub fn grounded(
        creator: impl Into<String>,
        payload: impl Into<String>,
        source: &InformationUnit,
    ) -> Self {
        Self {
            grounded_in: Some(source.id),
            ..Self::new(creator, payload)
        }
    }
}

/// 更新类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Add,
    Revoke,
    Commit,
}

/// 更新消息：有序的 (IU, UpdateType) 列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    updates: Vec<(InformationUnit, UpdateType)>,
}

impl UpdateMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iu(iu: InformationUnit, update_type: UpdateType) -> Self {
        Self {
            updates: vec![(iu, update_type)],
        }
    }

    pub fn add_iu(&mut self, iu: InformationUnit, update_type: UpdateType) {
        self.updates.push((iu, update_type));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(InformationUnit, UpdateType)> {
        self.updates.iter()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl IntoIterator for UpdateMessage {
    type Item = (InformationUnit, UpdateType);
    type IntoIter = std::vec::IntoIter<(InformationUnit, UpdateType)>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}
