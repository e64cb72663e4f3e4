//! Reflector 离线 RLT 评估
//!
//! 对导出的会话 JSON（GET /api/session/:id 或 REPL 的 :save）重算滑动窗口通过率：
//!   cargo run --bin reflector-rlt -- 'data/sessions/*.json' --tau 0.75 --window 6

use anyhow::Context;
use clap::Parser;
use reflector::metrics::evaluate_file;

#[derive(Debug, Parser)]
#[command(name = "reflector-rlt", about = "Trailing-window RDS pass rate over saved sessions")]
struct Args {
    /// 会话文件路径或通配模式
    #[arg(required = true)]
    paths: Vec<String>,

    #[arg(long, default_value_t = 0.75)]
    tau: f64,

    #[arg(long, default_value_t = 6)]
    window: usize,

    /// 输出完整 JSON 报告
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    reflector::observability::init("warn");
    let args = Args::parse();
    anyhow::ensure!(args.window >= 1, "--window must be >= 1");

    for pattern in &args.paths {
        let entries = glob::glob(pattern).with_context(|| format!("bad pattern {}", pattern))?;
        for entry in entries {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {}", e);
                    continue;
                }
            };
            let report = evaluate_file(&path, args.tau, args.window)?;
            if args.json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!(
                    "{} time\u{2265}\u{03c4}: {} pass_rate: {:.2}",
                    path.display(),
                    report.time_above_tau,
                    report.pass_rate
                );
            }
        }
    }
    Ok(())
}
