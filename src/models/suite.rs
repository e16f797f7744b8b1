use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::loaders;

/// 测试套件：有名字的脚本路径列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub scripts: Vec<PathBuf>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: Vec::new(),
        }
    }

    /// 套件文件路径：`<dir>/<name>.json`
    pub fn file_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.json", name))
    }

    /// 新建空套件并立即写盘
    pub async fn create(dir: &Path, name: &str) -> Result<Self> {
        let suite = Self::new(name);
        suite.save(dir).await?;
        info!("✓ 已创建套件: {}", name);
        Ok(suite)
    }

    /// 整体替换成员列表
    pub fn replace_members<I, P>(&mut self, scripts: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.scripts = scripts.into_iter().map(Into::into).collect();
    }

    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::file_path(dir, &self.name);
        loaders::save_suite_file(&path, &self.scripts).await?;
        Ok(path)
    }

    /// 从文件加载，套件名取文件名（不含扩展名）
    pub async fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .with_context(|| format!("无效的套件文件名: {}", path.display()))?;
        let scripts = loaders::load_suite_file(path).await?;
        Ok(Self { name, scripts })
    }

    /// 按名字在套件目录中查找
    pub async fn load_named(dir: &Path, name: &str) -> Result<Self> {
        let path = Self::file_path(dir, name);
        if !path.exists() {
            anyhow::bail!("套件不存在: {}", name);
        }
        Self::load(&path).await
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_edit_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut suite = Suite::create(dir.path(), "smoke").await.unwrap();
        assert!(Suite::load_named(dir.path(), "smoke").await.unwrap().is_empty());

        suite.replace_members(["login.json", "search.json"]);
        suite.save(dir.path()).await.unwrap();
        suite.replace_members(["checkout.json"]);
        suite.save(dir.path()).await.unwrap();

        let loaded = Suite::load_named(dir.path(), "smoke").await.unwrap();
        assert_eq!(loaded.name, "smoke");
        assert_eq!(loaded.scripts, vec![PathBuf::from("checkout.json")]);
    }

    #[tokio::test]
    async fn test_missing_suite() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Suite::load_named(dir.path(), "nope").await.is_err());
    }
}
