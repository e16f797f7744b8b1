use crate::error::{ScriptError, ScriptResult};
use crate::models::block::{
    Action, BlockKind, DbCredentials, ElementTarget, LocatorStrategy, NavDirection, Position,
    Predicate, RetrieveSpec,
};
use crate::models::document::ScriptDocument;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 脚本文件中的一个块
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockEntry {
    #[serde(rename = "type")]
    kind: String,
    coords: Vec<f64>,
    values: Vec<String>,
}

/// 把文档编码为 JSON 数组
pub fn encode_document(doc: &ScriptDocument) -> ScriptResult<Vec<u8>> {
    let entries: Vec<BlockEntry> = doc
        .blocks()
        .iter()
        .map(|block| BlockEntry {
            kind: block.kind().label().to_string(),
            coords: block.bounds().to_vec(),
            values: action_to_values(&block.action),
        })
        .collect();
    Ok(serde_json::to_vec(&entries)?)
}

/// 从 JSON 数组解码文档
pub fn decode_document(bytes: &[u8]) -> ScriptResult<ScriptDocument> {
    let entries: Vec<BlockEntry> = serde_json::from_slice(bytes)
        .map_err(|e| ScriptError::malformed(format!("not a script document: {}", e)))?;

    let mut doc = ScriptDocument::new();
    for (idx, entry) in entries.into_iter().enumerate() {
        let kind = BlockKind::from_type_name(&entry.kind).ok_or_else(|| {
            ScriptError::malformed(format!("block {}: unknown type '{}'", idx, entry.kind))
        })?;
        if entry.coords.len() < 2 {
            return Err(ScriptError::malformed(format!(
                "block {}: coords needs at least 2 numbers, got {}",
                idx,
                entry.coords.len()
            )));
        }
        let position = Position::new(entry.coords[0], entry.coords[1]);
        let action = action_from_values(kind, entry.values).map_err(|e| match e {
            ScriptError::MalformedScript(msg) => {
                ScriptError::malformed(format!("block {}: {}", idx, msg))
            }
            other => other,
        })?;
        doc.insert(action, position);
    }
    Ok(doc)
}

/// 按固定顺序展开参数
fn action_to_values(action: &Action) -> Vec<String> {
    fn strategy(target: &ElementTarget) -> String {
        target
            .strategy
            .map(|s| s.as_str().to_string())
            .unwrap_or_default()
    }

    match action {
        Action::LaunchWeb { url } => vec![url.clone()],
        Action::Input { target, text } => {
            vec![strategy(target), target.identifier.clone(), text.clone()]
        }
        Action::DropdownSelect { target, option } => {
            vec![strategy(target), target.identifier.clone(), option.clone()]
        }
        Action::Click { target } | Action::RadioSelect { target } => {
            vec![strategy(target), target.identifier.clone()]
        }
        Action::StaticContentCheck {
            content,
            target,
            expected,
        } => vec![
            content.as_str().to_string(),
            strategy(target),
            target.identifier.clone(),
            expected.clone(),
        ],
        Action::Navigate { direction } => vec![direction.as_str().to_string()],
        Action::Delay { seconds } => vec![seconds.clone()],
        Action::DatabaseConnect(creds) => vec![
            creds.backend.clone(),
            creds.host.clone(),
            creds.database.clone(),
            creds.username.clone(),
            creds.password.clone(),
        ],
        Action::RetrieveData(spec) => {
            let mut values = vec![spec.select.clone(), spec.from.clone()];
            values.extend(spec.predicates.iter().map(|p| p.column.clone()));
            values.extend(spec.predicates.iter().map(|p| p.value.clone()));
            values
        }
    }
}

/// 按类型还原参数，values 数量必须与类型一致
fn action_from_values(kind: BlockKind, values: Vec<String>) -> ScriptResult<Action> {
    if values.len() != kind.arity() {
        return Err(ScriptError::malformed(format!(
            "'{}' expects {} values, got {}",
            kind.label(),
            kind.arity(),
            values.len()
        )));
    }

    fn target(strategy: String, identifier: String) -> ScriptResult<ElementTarget> {
        let strategy = if strategy.is_empty() {
            None
        } else {
            Some(strategy.parse::<LocatorStrategy>()?)
        };
        Ok(ElementTarget {
            strategy,
            identifier,
        })
    }

    let mut v = values.into_iter();
    let mut next = move || v.next().unwrap_or_default();

    let action = match kind {
        BlockKind::LaunchWeb => Action::LaunchWeb { url: next() },
        BlockKind::Input => Action::Input {
            target: target(next(), next())?,
            text: next(),
        },
        BlockKind::DropdownSelect => Action::DropdownSelect {
            target: target(next(), next())?,
            option: next(),
        },
        BlockKind::Click => Action::Click {
            target: target(next(), next())?,
        },
        BlockKind::RadioSelect => Action::RadioSelect {
            target: target(next(), next())?,
        },
        BlockKind::StaticContentCheck => Action::StaticContentCheck {
            content: next().parse()?,
            target: target(next(), next())?,
            expected: next(),
        },
        BlockKind::Navigate => Action::Navigate {
            direction: next().parse::<NavDirection>()?,
        },
        BlockKind::Delay => Action::Delay { seconds: next() },
        BlockKind::DatabaseConnect => Action::DatabaseConnect(DbCredentials {
            backend: next(),
            host: next(),
            database: next(),
            username: next(),
            password: next(),
        }),
        BlockKind::RetrieveData => {
            let select = next();
            let from = next();
            let columns = [next(), next(), next()];
            let values = [next(), next(), next()];
            let [c1, c2, c3] = columns;
            let [v1, v2, v3] = values;
            Action::RetrieveData(RetrieveSpec {
                select,
                from,
                predicates: [
                    Predicate::new(c1, v1),
                    Predicate::new(c2, v2),
                    Predicate::new(c3, v3),
                ],
            })
        }
    };
    Ok(action)
}

/// 从文件加载脚本
pub async fn load_script_file(path: &Path) -> Result<ScriptDocument> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("无法读取脚本文件: {}", path.display()))?;

    let mut doc = decode_document(&content)
        .with_context(|| format!("无法解析脚本文件: {}", path.display()))?;
    doc.set_path(path);

    Ok(doc)
}

/// 把脚本写入文件
pub async fn save_script_file(doc: &ScriptDocument, path: &Path) -> Result<()> {
    let bytes = encode_document(doc)?;
    fs::write(path, bytes)
        .await
        .with_context(|| format!("无法写入脚本文件: {}", path.display()))?;
    Ok(())
}

/// 读取套件文件（脚本路径数组）
pub async fn load_suite_file(path: &Path) -> Result<Vec<PathBuf>> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("无法读取套件文件: {}", path.display()))?;
    let scripts: Vec<PathBuf> = serde_json::from_slice(&content)
        .with_context(|| format!("无法解析套件文件: {}", path.display()))?;
    Ok(scripts)
}

/// 写入套件文件
pub async fn save_suite_file(path: &Path, scripts: &[PathBuf]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }
    }
    let bytes = serde_json::to_vec(scripts)?;
    fs::write(path, bytes)
        .await
        .with_context(|| format!("无法写入套件文件: {}", path.display()))?;
    Ok(())
}
