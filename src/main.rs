//! Reflector - 递归心智对话代理
//!
//! 入口：初始化日志、加载配置、创建会话，并在 stdin 上运行交互循环。
//! 以 `:` 开头的行是命令（:help 查看），其余行作为一轮用户输入。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reflector::config::load_config;
use reflector::core::{SessionRegistry, TurnOptions};
use reflector::llm::create_responder_from_config;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "reflector", about = "Interactive recursive theory-of-mind dialogue agent")]
struct Args {
    /// 额外的 TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 关闭节奏延迟
    #[arg(long)]
    no_pause: bool,
}

const HELP: &str = ":state  :metrics  :save <path>  :new  :depth <n>  \
:mem on|off  :pause on|off  :safety on|off  :quit";

fn parse_switch(arg: Option<&str>) -> Option<bool> {
    match arg {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reflector::observability::init("warn");
    let args = Args::parse();

    let cfg = load_config(args.config).context("Failed to load config")?;
    let session_config = cfg.session.to_session_config();
    let mut opts = cfg.turn.to_turn_options();
    if args.no_pause {
        opts.pacing_enabled = false;
    }

    let registry = Arc::new(SessionRegistry::new(create_responder_from_config(&cfg)));
    let mut session_id = registry
        .create(session_config)
        .await
        .context("Failed to create session")?;
    println!("session {} ({})", session_id, HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if let Some(cmd) = line.strip_prefix(':') {
            let mut parts = cmd.split_whitespace();
            let name = parts.next().unwrap_or_default();
            let arg = parts.next();
            match name {
                "quit" | "q" => break,
                "help" => println!("{}", HELP),
                "state" => {
                    let s = registry.snapshot(&session_id).await?;
                    println!("{}", serde_json::to_string_pretty(&s.state)?);
                }
                "metrics" => {
                    let m = registry.metrics(&session_id).await?;
                    println!("{}", serde_json::to_string_pretty(&m)?);
                }
                "save" => match arg {
                    Some(path) => {
                        let s = registry.snapshot(&session_id).await?;
                        std::fs::write(path, serde_json::to_string_pretty(&s)?)
                            .with_context(|| format!("Failed to write {}", path))?;
                        println!("saved {} turns to {}", s.history.len(), path);
                    }
                    None => println!("usage: :save <path>"),
                },
                "new" => {
                    registry.remove(&session_id).await;
                    session_id = registry.create(session_config).await?;
                    println!("session {}", session_id);
                }
                "depth" => match arg.and_then(|a| a.parse::<u32>().ok()) {
                    Some(d) if d >= 1 => opts.depth = d,
                    _ => println!("usage: :depth <positive integer>"),
                },
                "mem" | "pause" | "safety" => match parse_switch(arg) {
                    Some(on) => set_switch(&mut opts, name, on),
                    None => println!("usage: :{} on|off", name),
                },
                other => println!("unknown command :{} ({})", other, HELP),
            }
            continue;
        }

        match registry.respond(&session_id, Some(line), opts).await {
            Ok(turn) => {
                println!("{}", turn.reply);
                println!(
                    "  [pause {}ms  r {:.3}  rds_window {:.3}  above_tau {}]",
                    turn.pause_ms, turn.metrics.r, turn.metrics.rds_window, turn.metrics.turns_above_tau
                );
            }
            Err(e) => eprintln!("turn failed: {}", e),
        }
    }

    registry.clear().await;
    Ok(())
}

fn set_switch(opts: &mut TurnOptions, name: &str, on: bool) {
    match name {
        "mem" => opts.mem_enabled = on,
        "pause" => opts.pacing_enabled = on,
        _ => opts.guard_enabled = on,
    }
}
