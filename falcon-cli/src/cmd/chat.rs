//! `falcon chat`: interactive chat; the conversation history lives here.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use falcon_core::{ConversationTurn, Falcon, GenerationConfig, ModelLoader};

pub fn execute(config: GenerationConfig, loader: &dyn ModelLoader) -> Result<()> {
    let mut falcon = Falcon::new(config, loader)?;
    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();
    let mut out = std::io::stdout();
    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut line = String::new();

    writeln!(out, "Chat mode: type `exit` or `quit` to stop").context("write chat header")?;

    loop {
        write!(out, "> ").context("write prompt marker")?;
        out.flush().context("flush prompt marker")?;

        line.clear();
        let n = stdin.read_line(&mut line).context("read stdin line")?;
        if n == 0 {
            break;
        }
        let message = line.trim_end();
        if message.is_empty() {
            continue;
        }
        if is_exit(message) {
            break;
        }

        let reply = falcon
            .chat(message, &history, None)
            .context("generate chat reply")?;
        let response = reply.completion.trim().to_string();
        writeln!(out, "{response}").context("write chat reply")?;

        tracing::debug!(
            turns = history.len() + 1,
            generated_tokens = reply.generated_tokens,
            "chat turn done"
        );
        history.push(ConversationTurn::new(message, response));
    }

    Ok(())
}

fn is_exit(message: &str) -> bool {
    message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit")
}
