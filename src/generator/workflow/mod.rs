use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{ChatTurn, DiskOutlet, Outlet, grounding_notes, render_final_report};
use crate::generator::research::{self, ProgressEvent, ProgressSink, ResearchOutcome};
use crate::llm::LanguageModel;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

/// 进度轮询间隔
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(400);

const SPINNER_FRAMES: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    /// 按结束顺序记录
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时，未开始的阶段返回None
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations
            .push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "Total time: {:.2}s\n",
            self.total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\nPhases:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}s\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 终端状态面板：记录每条进度文案，轮询超时时推进spinner
#[derive(Debug, Default)]
pub struct StatusBoard {
    lines: Vec<String>,
    rendered: usize,
    ticks: usize,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &ProgressEvent) {
        self.lines.push(event.to_string());
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn current(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.ticks % SPINNER_FRAMES.len()]
    }

    /// 取出尚未渲染过的文案
    pub fn take_new_lines(&mut self) -> &[String] {
        let start = self.rendered;
        self.rendered = self.lines.len();
        &self.lines[start..]
    }
}

/// 在后台任务中执行调研，并以固定间隔轮询进度
///
/// 每收到一条事件或每次轮询超时都会调用一次 `render`。
pub async fn run_with_status<M, F>(
    context: GeneratorContext<M>,
    query: String,
    mut render: F,
) -> Result<ResearchOutcome>
where
    M: LanguageModel + 'static,
    F: FnMut(&mut StatusBoard),
{
    let (progress, mut rx) = ProgressSink::channel();
    let handle = tokio::spawn(async move { research::execute(&context, progress, &query).await });

    let mut board = StatusBoard::new();
    loop {
        match tokio::time::timeout(STATUS_POLL_INTERVAL, rx.recv()).await {
            Ok(Some(event)) => {
                board.record(&event);
                render(&mut board);
            }
            // 所有发送端都已释放，调研任务已结束
            Ok(None) => break,
            Err(_) => {
                board.tick();
                render(&mut board);
                if handle.is_finished() {
                    break;
                }
            }
        }
    }
    while let Ok(event) = rx.try_recv() {
        board.record(&event);
    }
    render(&mut board);

    let outcome = handle.await.context("research task panicked")??;
    Ok(outcome)
}

/// 把新的进度文案打印到终端
pub fn print_status(board: &mut StatusBoard) {
    let spinner = board.spinner();
    let interactive = std::io::stderr().is_terminal();
    let lines = board.take_new_lines();
    if lines.is_empty() {
        if interactive {
            eprint!("\r{} ", spinner);
            let _ = std::io::stderr().flush();
        }
        return;
    }
    if interactive {
        eprint!("\r");
    }
    for line in lines {
        println!("{}", line);
    }
}

/// 调研结果渲染为一次回答
pub fn render_answer(outcome: &ResearchOutcome) -> String {
    let mut answer = render_final_report(&outcome.report);
    if let Some(notes) = grounding_notes(&outcome.grounding) {
        answer.push_str("\n\n");
        answer.push_str(&notes);
    }
    answer
}

pub fn render_error(error: &anyhow::Error) -> String {
    format!("**Error:** {:#}", error)
}

pub fn is_exit_command(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "exit" | "quit" | ":q"
    )
}

/// 启动调研：给出查询时执行一次，否则进入交互式对话
pub async fn launch(config: &Config, query: Option<String>) -> Result<()> {
    let context = GeneratorContext::new(config.clone())?;
    tracing::info!(
        model = %config.llm.model_spec(),
        search = %config.search.provider,
        mode = %config.research.mode,
        "deep research ready"
    );

    match query {
        Some(query) => run_single_shot(context, config, query).await,
        None => run_chat_loop(context, config).await,
    }
}

async fn run_single_shot<M: LanguageModel + 'static>(
    context: GeneratorContext<M>,
    config: &Config,
    query: String,
) -> Result<()> {
    let outcome = run_with_status(context, query.clone(), print_status).await?;
    println!("\n{}", render_answer(&outcome));

    if let Some(output_path) = &config.output_path {
        let path = DiskOutlet::new(output_path.clone())
            .save(&query, &outcome)
            .await?;
        println!("\n💾 Report saved to {}", path.display());
    }
    Ok(())
}

async fn run_chat_loop<M: LanguageModel + 'static>(
    context: GeneratorContext<M>,
    config: &Config,
) -> Result<()> {
    println!("🧭 Deep Research Agent. Enter a stock ticker (e.g. NVDA) or a research question. Type `exit` to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut transcript: Vec<ChatTurn> = Vec::new();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        let answer = match run_with_status(context.clone(), input.to_string(), print_status).await
        {
            Ok(outcome) => render_answer(&outcome),
            Err(error) => render_error(&error),
        };
        println!("\n{}", answer);
        transcript.push(ChatTurn {
            user: input.to_string(),
            assistant: answer,
        });
    }

    if let Some(output_path) = &config.output_path
        && !transcript.is_empty()
    {
        let path = DiskOutlet::new(output_path.clone()).save_transcript(&transcript)?;
        println!("💾 Transcript saved to {}", path.display());
    }
    Ok(())
}
