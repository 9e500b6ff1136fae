//! Shifu - 控制台导师
//!
//! 入口：初始化日志，构造编排器，进入命令行对话循环。

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shifu::config::{load_config, AppConfig};
use shifu::content::{ContentStore, Subject};
use shifu::llm::create_llm_from_config;
use shifu::session::create_session_store;
use shifu::Tutor;

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("config load failed: {}, using defaults", e);
        AppConfig::default()
    });

    let content = Arc::new(ContentStore::with_preset());
    let sessions = create_session_store(cfg.app.session_db.as_deref());
    let llm = create_llm_from_config(&cfg);
    let tutor = Tutor::new(content, sessions, llm, &cfg);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("请选择学科：");
    for (i, subject) in Subject::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, subject.display_name());
    }

    let subject = loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();
        if let Ok(n) = input.parse::<usize>() {
            if (1..=Subject::ALL.len()).contains(&n) {
                break Subject::ALL[n - 1];
            }
        }
        if let Some(subject) = Subject::parse(input) {
            break subject;
        }
        println!("没有这个学科，请输入 1-{} 或学科名", Subject::ALL.len());
    };

    let mut session = tutor.create_session("console", subject).await;
    if let Some(welcome) = session.messages.last() {
        println!("\n{}\n", welcome.content);
    }
    println!("（输入 /quit 结束对话）\n");

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "/quit" | "/exit" | "退出") {
            break;
        }

        let result = tutor.handle_turn(&mut session, message).await;
        println!("\n{}\n", result.response);
        if result.mastered {
            println!("🎉 本知识点已掌握！可以继续提问或换个主题学习。\n");
        }
    }

    println!("再见！👋");
    Ok(())
}
