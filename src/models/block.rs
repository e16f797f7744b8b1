//! 动作块数据模型
//!
//! 每个动作块是一个测试步骤：类型 + 画布坐标 + 该类型专属的参数。
//! 参数用带标签的枚举 [`Action`] 表示，执行引擎对它做穷尽匹配。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

// ========== 占位文本 ==========

pub const PLACEHOLDER_IDENTIFIER: &str = "element identifier";
pub const PLACEHOLDER_INPUT: &str = "input";
pub const PLACEHOLDER_HOST: &str = "Host/Server";
pub const PLACEHOLDER_DATABASE: &str = "Database Name";
pub const PLACEHOLDER_USERNAME: &str = "Username";
pub const PLACEHOLDER_PASSWORD: &str = "Password";
pub const PLACEHOLDER_SELECT: &str = "SELECT data";
pub const PLACEHOLDER_FROM: &str = "FROM table";
pub const PLACEHOLDER_COLUMNS: [&str; 3] = ["WHERE column1", "WHERE column2", "WHERE column3"];
pub const PLACEHOLDER_VALUES: [&str; 3] = ["Value 1", "Value 2", "Value 3"];

/// 动作块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    LaunchWeb,
    Input,
    Click,
    StaticContentCheck,
    DropdownSelect,
    RadioSelect,
    Navigate,
    Delay,
    DatabaseConnect,
    RetrieveData,
}

impl BlockKind {
    pub const ALL: [BlockKind; 10] = [
        BlockKind::LaunchWeb,
        BlockKind::Input,
        BlockKind::Click,
        BlockKind::StaticContentCheck,
        BlockKind::DropdownSelect,
        BlockKind::RadioSelect,
        BlockKind::Navigate,
        BlockKind::Delay,
        BlockKind::DatabaseConnect,
        BlockKind::RetrieveData,
    ];

    /// 脚本文件中 `type` 字段使用的标签
    pub fn label(self) -> &'static str {
        match self {
            BlockKind::LaunchWeb => "Launch Web:",
            BlockKind::Input => "Input by",
            BlockKind::Click => "Click",
            BlockKind::StaticContentCheck => "Static content",
            BlockKind::DropdownSelect => "Dropdown option",
            BlockKind::RadioSelect => "Radio button",
            BlockKind::Navigate => "Navigate",
            BlockKind::Delay => "Delay:",
            BlockKind::DatabaseConnect => "Database",
            BlockKind::RetrieveData => "Retrieve data",
        }
    }

    /// 变体名称（读取时也接受）
    pub fn name(self) -> &'static str {
        match self {
            BlockKind::LaunchWeb => "LaunchWeb",
            BlockKind::Input => "Input",
            BlockKind::Click => "Click",
            BlockKind::StaticContentCheck => "StaticContentCheck",
            BlockKind::DropdownSelect => "DropdownSelect",
            BlockKind::RadioSelect => "RadioSelect",
            BlockKind::Navigate => "Navigate",
            BlockKind::Delay => "Delay",
            BlockKind::DatabaseConnect => "DatabaseConnect",
            BlockKind::RetrieveData => "RetrieveData",
        }
    }

    /// 从 `type` 字段解析，标签和变体名称都可以
    pub fn from_type_name(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == s || kind.name() == s)
    }

    /// 块在画布上的尺寸 (宽, 高)
    pub fn footprint(self) -> (f64, f64) {
        match self {
            BlockKind::LaunchWeb => (400.0, 50.0),
            BlockKind::Input => (560.0, 50.0),
            BlockKind::Click => (530.0, 50.0),
            BlockKind::StaticContentCheck => (700.0, 50.0),
            BlockKind::DropdownSelect => (660.0, 50.0),
            BlockKind::RadioSelect => (530.0, 50.0),
            BlockKind::Navigate => (200.0, 50.0),
            BlockKind::Delay => (200.0, 50.0),
            BlockKind::DatabaseConnect => (500.0, 80.0),
            BlockKind::RetrieveData => (620.0, 100.0),
        }
    }

    /// `values` 数组的固定长度
    pub fn arity(self) -> usize {
        match self {
            BlockKind::LaunchWeb | BlockKind::Navigate | BlockKind::Delay => 1,
            BlockKind::Click | BlockKind::RadioSelect => 2,
            BlockKind::Input | BlockKind::DropdownSelect => 3,
            BlockKind::StaticContentCheck => 4,
            BlockKind::DatabaseConnect => 5,
            BlockKind::RetrieveData => 8,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 元素定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorStrategy {
    Name,
    Id,
    ClassName,
    CssSelector,
    LinkText,
    PartialLinkText,
    TagName,
    XPath,
}

impl LocatorStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            LocatorStrategy::Name => "NAME",
            LocatorStrategy::Id => "ID",
            LocatorStrategy::ClassName => "CLASS_NAME",
            LocatorStrategy::CssSelector => "CSS_SELECTOR",
            LocatorStrategy::LinkText => "LINK_TEXT",
            LocatorStrategy::PartialLinkText => "PARTIAL_LINK_TEXT",
            LocatorStrategy::TagName => "TAG_NAME",
            LocatorStrategy::XPath => "XPATH",
        }
    }
}

impl FromStr for LocatorStrategy {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NAME" => Ok(LocatorStrategy::Name),
            "ID" => Ok(LocatorStrategy::Id),
            "CLASS_NAME" => Ok(LocatorStrategy::ClassName),
            "CSS_SELECTOR" => Ok(LocatorStrategy::CssSelector),
            "LINK_TEXT" => Ok(LocatorStrategy::LinkText),
            "PARTIAL_LINK_TEXT" => Ok(LocatorStrategy::PartialLinkText),
            "TAG_NAME" => Ok(LocatorStrategy::TagName),
            "XPATH" => Ok(LocatorStrategy::XPath),
            other => Err(ScriptError::malformed(format!(
                "unknown locator strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 静态内容校验的比较对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Text,
    Image,
    Icon,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "Text",
            ContentType::Image => "Image",
            ContentType::Icon => "Icon",
        }
    }
}

impl FromStr for ContentType {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Text" => Ok(ContentType::Text),
            "Image" => Ok(ContentType::Image),
            "Icon" => Ok(ContentType::Icon),
            other => Err(ScriptError::malformed(format!(
                "unknown content type '{}'",
                other
            ))),
        }
    }
}

/// 浏览器历史导航
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavDirection {
    Backward,
    Forward,
    Refresh,
}

impl NavDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            NavDirection::Backward => "Backward",
            NavDirection::Forward => "Forward",
            NavDirection::Refresh => "Refresh",
        }
    }
}

impl FromStr for NavDirection {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Backward" => Ok(NavDirection::Backward),
            "Forward" => Ok(NavDirection::Forward),
            "Refresh" => Ok(NavDirection::Refresh),
            other => Err(ScriptError::malformed(format!(
                "unknown navigation '{}'",
                other
            ))),
        }
    }
}

/// 页面元素的定位参数
///
/// 定位方式允许为空（编辑器里清空了下拉框），此时该步骤被跳过。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTarget {
    pub strategy: Option<LocatorStrategy>,
    pub identifier: String,
}

impl ElementTarget {
    pub fn new(strategy: LocatorStrategy, identifier: impl Into<String>) -> Self {
        Self {
            strategy: Some(strategy),
            identifier: identifier.into(),
        }
    }

    /// 定位方式和标识都非空时返回可用的定位器
    pub fn resolve(&self) -> Option<(LocatorStrategy, &str)> {
        match self.strategy {
            Some(strategy) if !self.identifier.is_empty() => Some((strategy, &self.identifier)),
            _ => None,
        }
    }
}

impl Default for ElementTarget {
    fn default() -> Self {
        Self::new(LocatorStrategy::Name, PLACEHOLDER_IDENTIFIER)
    }
}

/// RetrieveData 的一个 WHERE 条件（列 + 绑定值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub value: String,
}

impl Predicate {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    fn placeholder(slot: usize) -> Self {
        Self::new(PLACEHOLDER_COLUMNS[slot], PLACEHOLDER_VALUES[slot])
    }

    /// 可选条件是否生效：列和值都非空，且都不是占位文本
    fn is_filled(&self, slot: usize) -> bool {
        !self.column.is_empty()
            && !self.value.is_empty()
            && self.column != PLACEHOLDER_COLUMNS[slot]
            && self.value != PLACEHOLDER_VALUES[slot]
    }
}

/// 数据库连接参数
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DbCredentials {
    /// 后端名称，运行时解析（MySQL / PostgreSQL / Microsoft SQL Server）
    pub backend: String,
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbCredentials {
    /// 日志中使用的连接目标，不含密码
    pub fn target(&self) -> String {
        format!("{}/{}", self.host, self.database)
    }
}

impl Default for DbCredentials {
    fn default() -> Self {
        Self {
            backend: "MySQL".to_string(),
            host: PLACEHOLDER_HOST.to_string(),
            database: PLACEHOLDER_DATABASE.to_string(),
            username: PLACEHOLDER_USERNAME.to_string(),
            password: PLACEHOLDER_PASSWORD.to_string(),
        }
    }
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// RetrieveData 的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveSpec {
    pub select: String,
    pub from: String,
    pub predicates: [Predicate; 3],
}

impl RetrieveSpec {
    /// 实际参与查询的条件
    ///
    /// 第一个条件总是生效；第二个条件按成对规则决定；第三个条件只有在
    /// 第二个也生效时才会追加，不会被提升到第二个位置。
    pub fn active_predicates(&self) -> Vec<&Predicate> {
        let mut active = vec![&self.predicates[0]];
        if self.predicates[1].is_filled(1) {
            active.push(&self.predicates[1]);
            if self.predicates[2].is_filled(2) {
                active.push(&self.predicates[2]);
            }
        }
        active
    }
}

impl Default for RetrieveSpec {
    fn default() -> Self {
        Self {
            select: PLACEHOLDER_SELECT.to_string(),
            from: PLACEHOLDER_FROM.to_string(),
            predicates: [
                Predicate::placeholder(0),
                Predicate::placeholder(1),
                Predicate::placeholder(2),
            ],
        }
    }
}

/// 动作块参数，每种类型一个变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    LaunchWeb {
        url: String,
    },
    Input {
        target: ElementTarget,
        text: String,
    },
    Click {
        target: ElementTarget,
    },
    StaticContentCheck {
        content: ContentType,
        target: ElementTarget,
        expected: String,
    },
    DropdownSelect {
        target: ElementTarget,
        option: String,
    },
    RadioSelect {
        target: ElementTarget,
    },
    Navigate {
        direction: NavDirection,
    },
    Delay {
        seconds: String,
    },
    DatabaseConnect(DbCredentials),
    RetrieveData(RetrieveSpec),
}

impl Action {
    /// 带占位默认值的新动作
    pub fn with_defaults(kind: BlockKind) -> Self {
        match kind {
            BlockKind::LaunchWeb => Action::LaunchWeb { url: String::new() },
            BlockKind::Input => Action::Input {
                target: ElementTarget::default(),
                text: PLACEHOLDER_INPUT.to_string(),
            },
            BlockKind::Click => Action::Click {
                target: ElementTarget::default(),
            },
            BlockKind::StaticContentCheck => Action::StaticContentCheck {
                content: ContentType::Text,
                target: ElementTarget::default(),
                expected: PLACEHOLDER_INPUT.to_string(),
            },
            BlockKind::DropdownSelect => Action::DropdownSelect {
                target: ElementTarget::default(),
                option: PLACEHOLDER_INPUT.to_string(),
            },
            BlockKind::RadioSelect => Action::RadioSelect {
                target: ElementTarget::default(),
            },
            BlockKind::Navigate => Action::Navigate {
                direction: NavDirection::Backward,
            },
            BlockKind::Delay => Action::Delay {
                seconds: String::new(),
            },
            BlockKind::DatabaseConnect => Action::DatabaseConnect(DbCredentials::default()),
            BlockKind::RetrieveData => Action::RetrieveData(RetrieveSpec::default()),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Action::LaunchWeb { .. } => BlockKind::LaunchWeb,
            Action::Input { .. } => BlockKind::Input,
            Action::Click { .. } => BlockKind::Click,
            Action::StaticContentCheck { .. } => BlockKind::StaticContentCheck,
            Action::DropdownSelect { .. } => BlockKind::DropdownSelect,
            Action::RadioSelect { .. } => BlockKind::RadioSelect,
            Action::Navigate { .. } => BlockKind::Navigate,
            Action::Delay { .. } => BlockKind::Delay,
            Action::DatabaseConnect(_) => BlockKind::DatabaseConnect,
            Action::RetrieveData(_) => BlockKind::RetrieveData,
        }
    }
}

/// 画布坐标（块的左上角）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// 文档内的块编号，只在内存中使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 一个动作块
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBlock {
    pub id: BlockId,
    pub position: Position,
    pub action: Action,
}

impl ActionBlock {
    pub fn kind(&self) -> BlockKind {
        self.action.kind()
    }

    /// 外框 [x1, y1, x2, y2]
    pub fn bounds(&self) -> [f64; 4] {
        let (width, height) = self.kind().footprint();
        [
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        ]
    }

    /// 下边缘的 y 坐标
    pub fn bottom(&self) -> f64 {
        self.bounds()[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieve(values: [(&str, &str); 3]) -> RetrieveSpec {
        RetrieveSpec {
            select: "name".to_string(),
            from: "users".to_string(),
            predicates: values.map(|(c, v)| Predicate::new(c, v)),
        }
    }

    #[test]
    fn test_type_name_accepts_label_and_variant() {
        assert_eq!(
            BlockKind::from_type_name("Launch Web:"),
            Some(BlockKind::LaunchWeb)
        );
        assert_eq!(
            BlockKind::from_type_name("RetrieveData"),
            Some(BlockKind::RetrieveData)
        );
        assert_eq!(BlockKind::from_type_name("Teleport"), None);
    }

    #[test]
    fn test_defaults_match_kind() {
        for kind in BlockKind::ALL {
            assert_eq!(Action::with_defaults(kind).kind(), kind);
        }
    }

    #[test]
    fn test_target_requires_strategy_and_identifier() {
        let empty_id = ElementTarget::new(LocatorStrategy::Id, "");
        assert!(empty_id.resolve().is_none());

        let no_strategy = ElementTarget {
            strategy: None,
            identifier: "q".to_string(),
        };
        assert!(no_strategy.resolve().is_none());

        let ok = ElementTarget::new(LocatorStrategy::Id, "q");
        assert_eq!(ok.resolve(), Some((LocatorStrategy::Id, "q")));
    }

    #[test]
    fn test_placeholder_predicates_are_inactive() {
        let spec = RetrieveSpec::default();
        assert_eq!(spec.active_predicates().len(), 1);
    }

    #[test]
    fn test_all_three_predicates_active() {
        let spec = retrieve([("id", "1"), ("email", "a@b.c"), ("active", "1")]);
        let active = spec.active_predicates();
        assert_eq!(active.len(), 3);
        assert_eq!(active[2].column, "active");
    }

    #[test]
    fn test_third_predicate_not_promoted() {
        let spec = retrieve([("id", "1"), ("", "Value 2"), ("active", "1")]);
        let active = spec.active_predicates();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].column, "id");
    }

    #[test]
    fn test_pair_rule_needs_both_sides() {
        let spec = retrieve([("id", "1"), ("email", ""), ("WHERE column3", "Value 3")]);
        assert_eq!(spec.active_predicates().len(), 1);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = DbCredentials {
            password: "hunter2".to_string(),
            ..DbCredentials::default()
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_bounds_follow_footprint() {
        let block = ActionBlock {
            id: BlockId(0),
            position: Position::new(50.0, 120.0),
            action: Action::with_defaults(BlockKind::DatabaseConnect),
        };
        assert_eq!(block.bounds(), [50.0, 120.0, 550.0, 200.0]);
        assert_eq!(block.bottom(), 200.0);
    }
}
