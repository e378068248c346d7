//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::EngineError;
use crate::eval::{EvaluationSource, RawEval};

/// Stockfish engine instance. The process is acquired once per analysis
/// session and released on every exit path: `quit()` on the normal path,
/// kill-on-drop otherwise.
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    nodes: u32,
    timeout_ms: u64,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI.
    pub async fn new(path: &str, nodes: u32, timeout_ms: u64) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            nodes,
            timeout_ms,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Io(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Io(format!("failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| EngineError::Io(format!("failed to read from engine: {e}")))?;
        if n == 0 {
            return Err(EngineError::Io("engine closed its stdout".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Wait for a specific response line, bounded by the call timeout.
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        let timeout_ms = self.timeout_ms;
        let wait = async {
            loop {
                let line = self.read_line().await?;
                debug!(line = %line, "SF >");
                if line == expected {
                    return Ok(());
                }
            }
        };
        let result = tokio::time::timeout(Duration::from_millis(timeout_ms), wait).await;
        result.unwrap_or(Err(EngineError::Timeout(timeout_ms)))
    }

    /// Read score lines until `bestmove` arrives.
    async fn read_bestmove(&mut self) -> Result<RawEval, EngineError> {
        let mut result = RawEval::default();

        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" pv ") {
                if let Some(cp) = parse_cp(&line) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(&line) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if line.starts_with("bestmove") {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] != "(none)" {
                    result.best_move = parts[1].to_string();
                }
                return Ok(result);
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl EvaluationSource for StockfishEngine {
    async fn evaluate(&mut self, fen: &str) -> Result<RawEval, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go nodes {}", self.nodes)).await?;

        let timeout_ms = self.timeout_ms;
        let search =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.read_bestmove()).await;
        match search {
            Ok(result) => result,
            Err(_) => {
                // Search overran its budget. Stop it and drain the pending
                // bestmove so the next call starts from a clean protocol state.
                let _ = self.send("stop").await;
                let _ =
                    tokio::time::timeout(Duration::from_millis(1_000), self.read_bestmove()).await;
                Err(EngineError::Timeout(timeout_ms))
            }
        }
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}
