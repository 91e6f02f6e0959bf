use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use mathmate_application::{FollowUpController, SessionHandle, SolveOrchestrator};
use mathmate_core::history::HistoryStore;
use mathmate_core::solve::{ImageData, SolveMode, SolveRequest, SolveResult};
use mathmate_infrastructure::Preferences;
use mathmate_interaction::{GeminiChatClient, GeminiClient};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct SolveArgs {
    pub question: Option<String>,
    pub mcq: bool,
    pub options: Vec<String>,
    pub image: Option<PathBuf>,
    pub tolerance: f64,
    pub language: Option<String>,
    pub interactive: bool,
}

pub async fn run(args: SolveArgs) -> Result<()> {
    let store = super::open_store()?;
    let prefs = Preferences::new(store.clone());
    if prefs.is_first_run() {
        println!("Welcome to MathMate. Configure GEMINI_API_KEY or secret.json to get started.");
        prefs.mark_first_run_done()?;
    }
    let language = args.language.unwrap_or_else(|| prefs.language());

    let mode = if args.mcq {
        SolveMode::Mcq
    } else {
        SolveMode::Essay
    };
    let mut request = SolveRequest::new(mode, args.question.unwrap_or_default())
        .with_options(args.options)
        .with_tolerance(args.tolerance);
    if let Some(path) = &args.image {
        request = request.with_image(load_image(path)?);
    }
    if request.question_text.trim().is_empty() && request.image.is_none() {
        bail!("provide a question or --image");
    }

    let client = GeminiClient::try_from_config()?;
    let history = Arc::new(RwLock::new(HistoryStore::load(store)));
    let session = SessionHandle::new();
    let orchestrator = SolveOrchestrator::new(Arc::new(client.clone()), history, session.clone());

    let result = orchestrator.solve(&request, &language).await?;
    print_result(&result, &request);

    if args.interactive {
        if session.snapshot().await.conversation.is_none() {
            println!("(no follow-up conversation available for this result)");
            return Ok(());
        }
        let followup = FollowUpController::new(Arc::new(GeminiChatClient::new(client)), session);
        follow_up_loop(&followup, &language).await?;
    }

    Ok(())
}

fn load_image(path: &Path) -> Result<ImageData> {
    let mime_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        other => bail!("unsupported image extension: {:?}", other),
    };

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image at {:?}", path))?;

    Ok(ImageData {
        data_base64: BASE64_STANDARD.encode(bytes),
        mime_type: mime_type.to_string(),
    })
}

fn print_result(result: &SolveResult, request: &SolveRequest) {
    match result {
        SolveResult::Mcq(r) => {
            if let Some(reason) = &r.fail_reason {
                println!("Could not solve: {reason}");
                return;
            }
            println!("Answer: option {} ({})", r.answer_index, r.answer_text);
            for (i, option) in request.normalized().options.iter().enumerate() {
                let marker = if i as i32 == r.answer_index { "*" } else { " " };
                println!("  {marker} {i}. {option}");
            }
            println!("Expression: {} = {}", r.normalized_expression, r.value);
            println!("Confidence: {:.2}", r.confidence);
            println!("\n{}", r.explanation);
        }
        SolveResult::Essay(r) => {
            if let Some(reason) = &r.fail_reason {
                println!("Could not solve: {reason}");
                return;
            }
            println!("Answer: {}", r.answer);
            println!("\n{}", r.explanation);
        }
    }
}

async fn follow_up_loop(followup: &FollowUpController, language: &str) -> Result<()> {
    println!("\nAsk follow-up questions about this solution (empty line to quit).");
    let stdin = std::io::stdin();

    loop {
        print!("? ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() || question == "quit" || question == "exit" {
            break;
        }

        match followup.ask(question, language).await? {
            Some(answer) => println!("{answer}\n"),
            None => break,
        }
    }

    Ok(())
}
