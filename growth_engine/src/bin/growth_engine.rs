use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use campaign_dispatch::gateway::klaviyo_rest::KlaviyoGateway;
use growth_engine::{
    analysis,
    config::{scoring, templates},
    db::{connection::connect_sqlite, migrate},
    kind::AnalysisKind,
    models::{feedback::FeedbackAction, strategy::StrategyStatus},
    peers::{provider::SqlitePeerProvider, seed, sync},
    store::{MerchantStore, SqliteStore, StrategyStore},
    strategy::{deploy, generate, lifecycle},
};

#[derive(Parser)]
#[command(version, about = "Growth Engine CLI")]
struct Cli {
    /// Scoring config TOML; the built-in default profile when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    scoring_config: Option<String>,

    /// Strategy template TOML; the built-in default catalog when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    templates: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Merchant registration and metric sync.
    Merchant(MerchantCmd),
    /// Peer benchmark maintenance.
    Peers(PeersCmd),
    /// Run (or reuse) an analysis for a merchant.
    Analyze {
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        kind: AnalysisKind,
        /// Bypass the cached result and recompute.
        #[arg(long)]
        force: bool,
    },
    /// Strategy generation and lifecycle.
    Strategy(StrategyCmd),
    /// Record merchant feedback on a strategy.
    Feedback {
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        action: FeedbackAction,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Args)]
struct MerchantCmd {
    #[command(subcommand)]
    sub: MerchantSub,
}

#[derive(Subcommand)]
enum MerchantSub {
    /// Register a merchant.
    Register {
        #[arg(long)]
        code: String,
        #[arg(long)]
        shop_name: String,
        #[arg(long)]
        vertical: String,
    },
    /// Apply a metric sync, stamping metrics_synced_at with the current time.
    SyncMetrics {
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        monthly_revenue: f64,
        #[arg(long)]
        total_customers: i32,
        #[arg(long)]
        total_orders: i32,
        #[arg(long)]
        aov: f64,
        #[arg(long)]
        repeat_purchase_rate: f64,
        #[arg(long)]
        ltv: f64,
        #[arg(long)]
        customer_acquisition_cost: f64,
        #[arg(long)]
        email_subscriber_count: i32,
        #[arg(long)]
        discount_frequency: f64,
        #[arg(long)]
        campaign_engagement: f64,
    },
    /// Store the email-marketing integration API key.
    SetApiKey {
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        api_key: String,
    },
}

#[derive(Args)]
struct PeersCmd {
    #[command(subcommand)]
    sub: PeersSub,
}

#[derive(Subcommand)]
enum PeersSub {
    /// Sync a seed file into the peer_benchmarks table.
    Sync {
        #[arg(long, value_name = "FILE")]
        file: String,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        prune: bool,
    },
}

#[derive(Args)]
struct StrategyCmd {
    #[command(subcommand)]
    sub: StrategySub,
}

#[derive(Subcommand)]
enum StrategySub {
    /// Generate ranked strategies for a merchant.
    Generate {
        #[arg(long)]
        merchant: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// List a merchant's strategies by descending priority.
    List {
        #[arg(long)]
        merchant: String,
        #[arg(long)]
        status: Option<StrategyStatus>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Implement a strategy (recommended -> active).
    Implement {
        #[arg(long)]
        strategy: String,
    },
    /// Dismiss a strategy.
    Dismiss {
        #[arg(long)]
        strategy: String,
    },
    /// Complete an active strategy, recording the realized ROI.
    Complete {
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        actual_roi: f64,
    },
    /// Dispatch an active strategy to the email platform.
    Deploy {
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        list_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let scoring_cfg = match &cli.scoring_config {
        Some(path) => scoring::load_scoring_config_path(path)?,
        None => scoring::ScoringConfig::default(),
    };
    let catalog = match &cli.templates {
        Some(path) => templates::load_template_catalog_path(path)?,
        None => templates::TemplateCatalog::default(),
    };

    let db_url = shared_utils::env::get_env_var("DATABASE_URL")?;
    migrate::run_sqlite(&db_url)?;
    let mut conn = connect_sqlite(&db_url)?;
    let store = SqliteStore::new();

    match cli.cmd {
        Cmd::Merchant(MerchantCmd { sub }) => match sub {
            MerchantSub::Register {
                code,
                shop_name,
                vertical,
            } => {
                let row = store.insert_merchant(
                    &mut conn,
                    &growth_engine::models::merchant::NewMerchant {
                        merchant_code: &code,
                        shop_name: &shop_name,
                        vertical: &vertical,
                    },
                )?;
                println!("registered {} ({})", row.merchant_code, row.shop_name);
            }
            MerchantSub::SyncMetrics {
                merchant,
                monthly_revenue,
                total_customers,
                total_orders,
                aov,
                repeat_purchase_rate,
                ltv,
                customer_acquisition_cost,
                email_subscriber_count,
                discount_frequency,
                campaign_engagement,
            } => {
                let stamp = growth_engine::time::to_rfc3339_millis(chrono::Utc::now());
                let row = store.update_metrics(
                    &mut conn,
                    &merchant,
                    &growth_engine::models::merchant::MetricsUpdate {
                        monthly_revenue,
                        total_customers,
                        total_orders,
                        aov,
                        repeat_purchase_rate,
                        ltv,
                        customer_acquisition_cost,
                        email_subscriber_count,
                        discount_frequency,
                        campaign_engagement,
                        metrics_synced_at: &stamp,
                    },
                )?;
                println!(
                    "synced metrics for {} at {}",
                    row.merchant_code,
                    row.metrics_synced_at.as_deref().unwrap_or("n/a")
                );
            }
            MerchantSub::SetApiKey { merchant, api_key } => {
                store.set_dispatch_api_key(&mut conn, &merchant, Some(&api_key))?;
                println!("stored dispatch API key for {merchant}");
            }
        },

        Cmd::Peers(PeersCmd {
            sub: PeersSub::Sync { file, dry_run, prune },
        }) => {
            let seed = seed::load_peer_seed_path(&file)?;
            let opt = sync::SyncOptions { dry_run, prune };
            let diff = sync::sync_peer_benchmarks(&mut conn, seed, &opt)?;
            println!("{diff}");
            if dry_run {
                println!("\n(dry run: nothing written)");
            }
        }

        Cmd::Analyze {
            merchant,
            kind,
            force,
        } => {
            let peers = SqlitePeerProvider::new();
            let outcome = analysis::analyze(
                &mut conn,
                &store,
                &peers,
                &scoring_cfg,
                &merchant,
                kind,
                force,
            )?;
            let source = if outcome.recomputed { "computed" } else { "cached" };
            println!("{kind} analysis ({source}, {}):", outcome.result.computed_at);
            println!("{}", outcome.result.payload);
        }

        Cmd::Strategy(StrategyCmd { sub }) => match sub {
            StrategySub::Generate { merchant, limit } => {
                let rows = generate::generate(&mut conn, &store, &catalog, &merchant, limit)?;
                for row in rows {
                    println!(
                        "{}  {:<24} priority={:>6.2} roi={:>5.1}% {}",
                        row.strategy_code, row.name, row.priority_score, row.expected_roi, row.status
                    );
                }
            }
            StrategySub::List {
                merchant,
                status,
                limit,
            } => {
                let m = store.merchant_by_code(&mut conn, &merchant)?;
                let rows = store.list_strategies(&mut conn, m.id, status, limit)?;
                for row in rows {
                    println!(
                        "{}  {:<24} priority={:>6.2} status={}",
                        row.strategy_code, row.name, row.priority_score, row.status
                    );
                }
            }
            StrategySub::Implement { strategy } => {
                let row = lifecycle::implement(&mut conn, &store, &strategy)?;
                println!("{} is now {}", row.strategy_code, row.status);
            }
            StrategySub::Dismiss { strategy } => {
                let row = lifecycle::dismiss(&mut conn, &store, &strategy)?;
                println!("{} is now {}", row.strategy_code, row.status);
            }
            StrategySub::Complete {
                strategy,
                actual_roi,
            } => {
                let report = lifecycle::complete(&mut conn, &store, &strategy, actual_roi)?;
                println!(
                    "{} completed: actual ROI {:.1}% vs expected {:.1}% ({} prediction, variance {:+.1}%)",
                    report.strategy.strategy_code,
                    actual_roi,
                    report.strategy.expected_roi,
                    report.accuracy.as_str(),
                    report.variance_pct,
                );
            }
            StrategySub::Deploy { strategy, list_id } => {
                let row = store.strategy_by_code(&mut conn, &strategy)?;
                let merchant = store.merchant_by_id(&mut conn, row.merchant_id)?;
                let api_key = merchant.dispatch_api_key.clone().ok_or_else(|| {
                    anyhow::anyhow!(
                        "merchant {} has no dispatch API key configured",
                        merchant.merchant_code
                    )
                })?;
                let gateway = KlaviyoGateway::new(SecretString::new(api_key.into()))?;
                let receipt =
                    deploy::deploy(&mut conn, &store, &gateway, &strategy, &list_id).await?;
                println!(
                    "{} dispatched (remote id: {})",
                    receipt.strategy.strategy_code,
                    receipt.dispatch.remote_id.as_deref().unwrap_or("n/a"),
                );
            }
        },

        Cmd::Feedback {
            strategy,
            action,
            comment,
        } => {
            let outcome = lifecycle::record_feedback(
                &mut conn,
                &store,
                &strategy,
                action,
                comment.as_deref(),
            )?;
            println!(
                "recorded {} feedback; {} is now {}",
                outcome.record.action, outcome.strategy.strategy_code, outcome.strategy.status
            );
        }
    }

    Ok(())
}
