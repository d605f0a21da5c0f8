use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Total worked time in seconds. The backend reports it as a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkReportTotal {
    #[serde(default)]
    pub time: f64,
}

impl WorkReportTotal {
    pub fn seconds(&self) -> u64 {
        self.time.max(0.).trunc() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMinimal {
    pub id: i64,
    #[serde(default)]
    pub name: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntity {
    pub id: i64,
    pub name: Arc<str>,
    #[serde(default)]
    pub is_current: i64,
    pub category: CategoryMinimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithCategory {
    pub id: i64,
    pub name: Arc<str>,
    pub category: CategoryMinimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkReportByCategory {
    pub category: CategoryMinimal,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkReportByTask {
    pub task: TaskWithCategory,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStartRequest {
    pub task_id: i64,
}
