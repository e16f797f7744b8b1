//! 脚本文档
//!
//! 按插入顺序保存动作块；执行顺序每次由坐标重新推导，见 [`ExecutionPlan`]。

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::error::ScriptResult;
use crate::models::block::{Action, ActionBlock, BlockId, BlockKind, Position};
use crate::models::loaders;
use crate::models::ordering::{ExecutionPlan, SnapRule};

/// 复制块时的坐标偏移
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// 变更通知回调，编辑器据此标记未保存状态
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// 脚本文档
#[derive(Default)]
pub struct ScriptDocument {
    blocks: Vec<ActionBlock>,
    next_id: u64,
    path: Option<PathBuf>,
    on_change: Option<ChangeListener>,
}

impl ScriptDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件打开
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        loaders::load_script_file(path.as_ref()).await
    }

    /// 注册变更回调
    pub fn set_change_listener(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    fn notify(&self) {
        if let Some(listener) = &self.on_change {
            listener();
        }
    }

    pub fn blocks(&self) -> &[ActionBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&ActionBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// 添加一个带占位默认值的块
    pub fn add(&mut self, kind: BlockKind, position: Position) -> BlockId {
        self.insert(Action::with_defaults(kind), position)
    }

    /// 添加一个指定参数的块
    pub fn insert(&mut self, action: Action, position: Position) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push(ActionBlock {
            id,
            position,
            action,
        });
        self.notify();
        id
    }

    /// 复制块：参数深拷贝，坐标偏移 (+20, +20)，追加到末尾
    ///
    /// 没有给出块或块不存在时什么也不做。
    pub fn duplicate(&mut self, id: Option<BlockId>) -> Option<BlockId> {
        let source = self.block(id?)?;
        let action = source.action.clone();
        let position = source
            .position
            .offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        Some(self.insert(action, position))
    }

    /// 删除块，找不到时返回 false
    pub fn remove(&mut self, id: Option<BlockId>) -> bool {
        let Some(id) = id else {
            return false;
        };
        let Some(idx) = self.blocks.iter().position(|b| b.id == id) else {
            return false;
        };
        self.blocks.remove(idx);
        self.notify();
        true
    }

    /// 修改块参数，类型可以不同（编辑器里整体替换）
    pub fn update(&mut self, id: BlockId, action: Action) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.action = action;
        self.notify();
        true
    }

    /// 平移块，不做吸附
    pub fn move_by(&mut self, id: BlockId, dx: f64, dy: f64) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.position = block.position.offset(dx, dy);
        self.notify();
        true
    }

    /// 平移块后按吸附规则对齐到上方块的下边缘
    pub fn move_and_snap(&mut self, id: BlockId, dx: f64, dy: f64, rule: &SnapRule) -> bool {
        if !self.move_by(id, dx, dy) {
            return false;
        }
        if let Some(y) = rule.snap_target(&self.blocks, id) {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
                debug!("块 {} 吸附: y {} -> {}", id, block.position.y, y);
                block.position.y = y;
            }
        }
        true
    }

    /// 清空所有块
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.notify();
    }

    /// 按坐标生成执行计划
    pub fn build_order(&self) -> ExecutionPlan {
        ExecutionPlan::from_blocks(&self.blocks)
    }

    pub fn serialize(&self) -> ScriptResult<Vec<u8>> {
        loaders::encode_document(self)
    }

    pub fn deserialize(bytes: &[u8]) -> ScriptResult<Self> {
        loaders::decode_document(bytes)
    }

    /// 保存到文件并记住路径
    pub async fn save_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        loaders::save_script_file(self, path).await?;
        self.path = Some(path.to_path_buf());
        self.notify();
        Ok(())
    }

    /// 用文件内容替换当前所有块（保留回调）
    pub async fn load_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = loaders::load_script_file(path.as_ref()).await?;
        self.blocks = loaded.blocks;
        self.next_id = loaded.next_id;
        self.path = loaded.path;
        self.notify();
        Ok(())
    }
}

impl fmt::Debug for ScriptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDocument")
            .field("path", &self.path)
            .field("blocks", &self.blocks)
            .finish()
    }
}
