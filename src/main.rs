// Train n-gram language models on a sentence corpus and score them by
// perplexity and by reranking speech recognizer n-best lists.

extern crate anyhow;
extern crate clap;
extern crate env_logger;
extern crate kdam;
extern crate rand;
extern crate rusty_katz;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, ValueEnum};
use kdam::tqdm;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rusty_katz::data_reader::{NBestReader, SentenceReader};
use rusty_katz::errors::ModelError;
use rusty_katz::evaluator::{EvaluationReport, Evaluator};
use rusty_katz::io::{Load, Save};
use rusty_katz::lms::{
    Estimator, InterpolatedTrigramLM, KatzBigramLM, KatzTrigramLM, Lambdas, SriLM, UnigramLM, LM,
};
use rusty_katz::ngram_counts::NGramCounts;
use rusty_katz::tuning::{lambda_grid, GridSearch};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModelKind {
    Unigram,
    Bigram,
    Interpolated,
    KatzBigram,
    KatzTrigram,
    KatzInterpolated,
    Sri,
}

#[derive(Parser, Debug)]
#[command(author = "lambdaviking", version, about, long_about = None)]
struct Args {
    #[arg(long)]
    train_path: Option<String>,
    #[arg(long)]
    validate_path: Option<String>,
    #[arg(long)]
    nbest_path: Option<String>,

    #[arg(long, value_enum, default_value_t = ModelKind::Unigram)]
    model: ModelKind,
    // ARPA file read by the `sri` model.
    #[arg(long)]
    arpa_path: Option<String>,

    #[arg(long, default_value_t = 5)]
    cutoff: usize,
    #[arg(long, default_value_t = 0.5)]
    lambda1: f64,
    #[arg(long, default_value_t = 0.3)]
    lambda2: f64,

    // Grid search over these cutoffs and/or a lambda grid of this spacing.
    #[arg(long, short = 'k')]
    grid_cutoff: Vec<usize>,
    #[arg(long)]
    grid_lambda: Option<f64>,

    #[arg(long)]
    results_path: Option<String>,
    #[arg(long)]
    trials_path: Option<String>,
    #[arg(long)]
    counts_path: Option<String>,
    // Count tables saved by an earlier run with --counts-path.
    #[arg(long)]
    load_counts: Option<String>,

    #[arg(long, default_value_t = 10)]
    n_generate: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let training = match &args.train_path {
        Some(path) => Some(SentenceReader::read_all(path)?),
        None => None,
    };
    if let Some(training) = &training {
        println!("#(train): {}", training.len());
    }
    let validation = match &args.validate_path {
        Some(path) => Some(SentenceReader::read_all(path)?),
        None => None,
    };
    if let Some(validation) = &validation {
        println!("#(validate): {}", validation.len());
    }
    let lists = match &args.nbest_path {
        Some(path) => Some(NBestReader::read_all(path)?),
        None => None,
    };
    if let Some(lists) = &lists {
        println!("#(n-best lists): {}", lists.len());
    }

    let counts = match (&args.load_counts, &training) {
        (Some(path), _) => {
            let counts = NGramCounts::load(path)?;
            println!("Loaded counts from {}", path);
            counts
        }
        (None, Some(training)) => NGramCounts::from_sentences(tqdm!(training.iter())),
        (None, None) => bail!("one of --train-path or --load-counts is required"),
    };
    println!("#(tokens): {}", counts.n_tokens());
    println!("#(vocab): {}", counts.unigrams.len());
    if let Some(path) = &args.counts_path {
        counts.save(path)?;
        println!("Saved counts to {}", path);
    }

    let mut evaluator = Evaluator::new(validation.as_deref(), lists.as_deref());
    if let Some(training) = &training {
        evaluator = evaluator.with_training(training);
    }

    let lm: Box<dyn LM> = if args.model == ModelKind::Sri {
        let path = args
            .arpa_path
            .as_ref()
            .ok_or_else(|| anyhow!("--arpa-path is required by the sri model"))?;
        Box::new(SriLM::load(path)?)
    } else {
        let (lambdas, cutoff) = tune(&args, &counts, &evaluator)?;
        create_lm(args.model, &counts, lambdas, cutoff)?
    };

    let report = evaluator.evaluate(lm.as_ref())?;
    print_report(&report);
    if let Some(path) = &args.results_path {
        report.to_json(path)?;
    }

    if args.n_generate > 0 {
        println!("Generated sentences:");
        let mut rng = StdRng::seed_from_u64(args.seed);
        for _ in 0..args.n_generate {
            println!("  {}", lm.generate_sentence(&mut rng).join(" "));
        }
    }
    Ok(())
}

/// Hyperparameters from the flags, or the best point of a grid search when
/// one is requested.
fn tune(args: &Args, counts: &NGramCounts, evaluator: &Evaluator) -> Result<(Lambdas, usize)> {
    let lambdas = Lambdas::new(args.lambda1, args.lambda2)?;
    if args.grid_lambda.is_none() && args.grid_cutoff.is_empty() {
        return Ok((lambdas, args.cutoff));
    }

    let grid = match args.grid_lambda {
        Some(step) => lambda_grid(step),
        None => vec![lambdas],
    };
    let cutoffs = if args.grid_cutoff.is_empty() {
        vec![args.cutoff]
    } else {
        args.grid_cutoff.clone()
    };

    let mut search = GridSearch::new(evaluator);
    if let Some(path) = &args.trials_path {
        search = search.with_trials_path(path);
    }
    let result = search.run(&grid, &cutoffs, |lambdas, cutoff| {
        create_lm(args.model, counts, lambdas, cutoff)
    })?;
    match result.best {
        Some(best) => {
            println!(
                "Best parameters: lambda1 -> {}; lambda2 -> {}; K -> {}",
                best.lambda1, best.lambda2, best.cutoff
            );
            Ok((Lambdas::new(best.lambda1, best.lambda2)?, best.cutoff))
        }
        None => bail!("no grid point produced a model"),
    }
}

fn create_lm(
    model: ModelKind,
    counts: &NGramCounts,
    lambdas: Lambdas,
    cutoff: usize,
) -> Result<Box<dyn LM>, ModelError> {
    let lm: Box<dyn LM> = match model {
        ModelKind::Unigram => Box::new(UnigramLM::new(counts)?),
        ModelKind::Bigram => Box::new(InterpolatedTrigramLM::bigram(counts, lambdas.bigram())?),
        ModelKind::Interpolated => {
            Box::new(InterpolatedTrigramLM::new(counts, lambdas, Estimator::Empirical)?)
        }
        ModelKind::KatzBigram => Box::new(KatzBigramLM::new(counts, cutoff)?),
        ModelKind::KatzTrigram => Box::new(KatzTrigramLM::new(counts, cutoff)?),
        ModelKind::KatzInterpolated => Box::new(InterpolatedTrigramLM::new(
            counts,
            lambdas,
            Estimator::Katz { cutoff },
        )?),
        ModelKind::Sri => return Err(ModelError::NotEstimable("sri")),
    };
    Ok(lm)
}

fn print_report(report: &EvaluationReport) {
    println!("Model: {}", report.name);
    if let Some(perplexity) = report.training_perplexity {
        println!("  Training perplexity:   {:.3}", perplexity);
    }
    if let Some(perplexity) = report.validation_perplexity {
        println!("  Validation perplexity: {:.3}", perplexity);
    }
    if let Some(perplexity) = report.nbest_perplexity {
        println!("  N-best perplexity:     {:.3}", perplexity);
    }
    if let Some(baselines) = &report.baselines {
        println!("WER baselines:");
        println!("  Best path:  {:.4}", baselines.best_path);
        println!("  Worst path: {:.4}", baselines.worst_path);
        println!("  Avg path:   {:.4}", baselines.average_path);
    }
    if let Some(wer) = report.word_error_rate {
        println!("  Word error rate: {:.4}", wer);
    }
}
