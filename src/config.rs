//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REFLECTOR__*` 覆盖（双下划线表示嵌套，如 `REFLECTOR__SESSION__TAU=0.8`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::session::{DEPTH_DEFAULT, TAU_DEFAULT, WINDOW_DEFAULT};
use crate::core::{SessionConfig, TurnOptions};
use crate::metrics::ALPHA_DEFAULT;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionSection,
    pub turn: TurnSection,
    pub responder: ResponderSection,
    pub web: WebSection,
}

/// [session] 段：新会话的默认 tau / alpha / window
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_tau")]
    pub tau: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_window")]
    pub window: usize,
    /// RDS 层数上限，缺省按每轮 depth
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_tau() -> f64 {
    TAU_DEFAULT
}

fn default_alpha() -> f64 {
    ALPHA_DEFAULT
}

fn default_window() -> usize {
    WINDOW_DEFAULT
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tau: default_tau(),
            alpha: default_alpha(),
            window: default_window(),
            max_depth: None,
        }
    }
}

impl SessionSection {
    /// 未校验；由 Session::new 校验
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            tau: self.tau,
            alpha: self.alpha,
            window: self.window,
            max_depth: self.max_depth,
        }
    }
}

/// [turn] 段：单轮参数缺省值
#[derive(Debug, Clone, Deserialize)]
pub struct TurnSection {
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_true")]
    pub mem: bool,
    #[serde(default = "default_true")]
    pub pause: bool,
    #[serde(default = "default_true")]
    pub safety: bool,
}

fn default_depth() -> u32 {
    DEPTH_DEFAULT
}

fn default_true() -> bool {
    true
}

impl Default for TurnSection {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            mem: true,
            pause: true,
            safety: true,
        }
    }
}

impl TurnSection {
    pub fn to_turn_options(&self) -> TurnOptions {
        TurnOptions {
            depth: self.depth,
            mem_enabled: self.mem,
            pacing_enabled: self.pause,
            guard_enabled: self.safety,
        }
    }
}

/// [responder] 段：stub / mock / openai / deepseek
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderSection {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// 自定义 system prompt，支持 `{hint_meta}` 占位符
    pub system_prompt: Option<String>,
}

fn default_provider() -> String {
    "stub".to_string()
}

impl Default for ResponderSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            system_prompt: None,
        }
    }
}

/// [web] 段
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for WebSection {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// 从 config 目录加载配置，环境变量 REFLECTOR__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REFLECTOR__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    if let Some(name) = default_names
        .into_iter()
        .find(|name| std::path::Path::new(&format!("{}.toml", name)).exists())
    {
        builder = builder.add_source(config::File::with_name(name).required(false));
    }

    if let Some(path) = config_path.filter(|p| p.exists()) {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REFLECTOR")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
