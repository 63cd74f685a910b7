use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    admit, columns, fetch_report, navigate, submit_signup, AdminDashboard, AlertEvent,
    AlertPoller, EmployeeDashboard, FileCredentialStore, HttpBackend, InventoryBackend,
    ListView, ManagerDashboard, Navigation, Report, ReportKind, Session, SessionManager,
    SignupForm, StockForm, WarehouseDetails,
};
use listing::{InventoryMetrics, SortSpec, TimeRange};
use shared::{
    domain::{ProductId, Role, StockDirection, WarehouseId},
    error::ApiError,
    protocol::UserUpdate,
};
use tokio::sync::{broadcast, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "inventory-console", about = "Inventory management from the terminal")]
struct Cli {
    /// Overrides the configured backend URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Updates the signed-in user's own profile. Omitted fields keep their
    /// current values; the password changes only when given.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "employee")]
        role: String,
    },
    /// Shows what a dashboard path resolves to for the current session.
    Route { path: String },
    List {
        collection: Collection,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = client_core::view::DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    Metrics {
        #[arg(long, default_value = "month")]
        range: TimeRange,
    },
    /// Per-product stock across all warehouses. Admins also get unit price
    /// and value columns and may export the warehouse inventory.
    Consolidated {
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        /// Admin only: write the warehouse inventory CSV into this directory.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    Export {
        report: ReportKind,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    StockIn(StockArgs),
    StockOut(StockArgs),
    WatchAlerts {
        /// Stop after this many poll results.
        #[arg(long)]
        polls: Option<usize>,
    },
}

#[derive(clap::Args, Debug)]
struct StockArgs {
    #[arg(long)]
    product: i64,
    #[arg(long)]
    warehouse: i64,
    #[arg(long)]
    quantity: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Collection {
    Users,
    Products,
    Warehouses,
    Suppliers,
    Inventory,
    History,
    Alerts,
}

struct ListArgs {
    sort: Option<String>,
    desc: bool,
    page: usize,
    page_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    info!(api_base_url = %settings.api_base_url, "console starting");

    let backend: Arc<dyn InventoryBackend> = Arc::new(
        HttpBackend::new(&settings.backend_config()).context("invalid backend configuration")?,
    );
    let store = Arc::new(FileCredentialStore::new(&settings.credential_path));
    let session = SessionManager::new(Arc::clone(&backend), store);
    session.resolve().await;

    match cli.command {
        Command::Login { email, password } => match session.login(&email, &password).await {
            Some(user) => println!("signed in as {} ({})", user.email, role_label(&user.role)),
            None => bail!("Invalid credentials."),
        },
        Command::Logout => {
            session.logout();
            println!("signed out");
        }
        Command::Whoami => match session.snapshot() {
            Session::Authenticated(user) => {
                println!("{} <{}> {}", user.name, user.email, role_label(&user.role))
            }
            _ => println!("not signed in"),
        },
        Command::Signup {
            name,
            email,
            password,
            phone,
            role,
        } => {
            let form = SignupForm {
                name,
                email,
                password,
                phone_number: phone,
                role,
            };
            let user = submit_signup(&session, form).await?;
            println!("{} (user id {})", client_core::signup::SIGNUP_SUCCESS_MESSAGE, user.id);
        }
        Command::Route { path } => match navigate(&path, &session.snapshot()) {
            Navigation::Render(route) => println!("render {}", route.path()),
            Navigation::Redirect(route) => println!("redirect {}", route.path()),
            Navigation::Loading => println!("loading"),
            Navigation::NotFound => println!("not found"),
        },
        Command::List {
            collection,
            sort,
            desc,
            page,
            page_size,
        } => {
            let args = ListArgs {
                sort,
                desc,
                page,
                page_size,
            };
            list(&session, backend.as_ref(), collection, &args).await?;
        }
        Command::Metrics { range } => metrics(&session, &backend, &settings, range).await?,
        Command::Profile {
            name,
            email,
            phone,
            password,
        } => {
            let user = session
                .current_user()
                .ok_or_else(|| anyhow!("Please log in first."))?;
            let update = UserUpdate {
                name: name.unwrap_or(user.name),
                email: email.unwrap_or(user.email),
                phone_number: phone.or(user.phone_number),
                password_hash: password.filter(|p| !p.is_empty()),
            };
            let updated = session
                .update_profile(user.id, &update)
                .await
                .map_err(api_error)?;
            println!("profile updated: {} <{}>", updated.name, updated.email);
        }
        Command::Consolidated { sort, desc, export } => {
            let spec = match sort {
                Some(field) if desc => SortSpec::descending(field),
                Some(field) => SortSpec::ascending(field),
                None => SortSpec::descending("total"),
            };
            consolidated(&session, &backend, &spec, export).await?
        }
        Command::Export { report, out } => {
            admit(&session, &Role::Admin).await?;
            let report = fetch_report(backend.as_ref(), report)
                .await
                .map_err(api_error)?;
            write_report(&report, &out)?;
        }
        Command::StockIn(args) => {
            adjust(&session, &backend, &settings, StockDirection::In, args).await?
        }
        Command::StockOut(args) => {
            adjust(&session, &backend, &settings, StockDirection::Out, args).await?
        }
        Command::WatchAlerts { polls } => {
            watch_alerts(&session, &backend, &settings, polls).await?
        }
    }

    Ok(())
}

fn role_label(role: &Option<Role>) -> &str {
    role.as_ref().map_or("no role", |role| role.as_str())
}

fn api_error(err: ApiError) -> anyhow::Error {
    anyhow!(err.user_message())
}

fn write_report(report: &Report, out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create '{}'", out.display()))?;
    let path = out.join(report.file_name(chrono::Local::now().date_naive()));
    fs::write(&path, report.to_csv())
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    println!("wrote {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

fn print_view<T>(view: &mut ListView<T>, args: &ListArgs) -> Result<()> {
    if let (Some(message), true) = (view.error(), view.items().is_empty()) {
        bail!("{message}");
    }
    if let Some(field) = &args.sort {
        if !view.accessors().contains(field) {
            let known: Vec<_> = view.accessors().field_names().collect();
            bail!("unknown sort field '{field}'; expected one of {}", known.join(", "));
        }
        view.set_sort(if args.desc {
            SortSpec::descending(field.as_str())
        } else {
            SortSpec::ascending(field.as_str())
        });
    }
    view.set_page_size(args.page_size);
    view.go_to_page(args.page);

    let fields: Vec<&'static str> = view.accessors().field_names().collect();
    println!("{}", fields.join("\t"));
    let page = view.rows();
    for row in &page.rows {
        let cells: Vec<_> = fields
            .iter()
            .map(|field| view.accessors().read(field, row).into_owned())
            .collect();
        println!("{}", cells.join("\t"));
    }
    println!("page {} ({} items)", page.indicator(), page.total_items);
    Ok(())
}

async fn list(
    session: &SessionManager,
    backend: &dyn InventoryBackend,
    collection: Collection,
    args: &ListArgs,
) -> Result<()> {
    let required = match collection {
        Collection::Users | Collection::Warehouses | Collection::Alerts => Role::Admin,
        Collection::Suppliers => Role::Manager,
        Collection::Products | Collection::Inventory | Collection::History => {
            match session.wait_until_resolved().await.role() {
                Some(role) => role.clone(),
                None => Role::Employee,
            }
        }
    };
    admit(session, &required).await?;

    macro_rules! show {
        ($accessors:expr, $fetch:expr) => {{
            let mut view = ListView::new($accessors);
            let ticket = view.begin_fetch();
            let result = $fetch.await;
            view.apply(ticket, result);
            print_view(&mut view, args)
        }};
    }

    match collection {
        Collection::Users => show!(columns::users(), backend.list_users()),
        Collection::Products => show!(columns::products(), backend.list_products()),
        Collection::Warehouses => show!(columns::warehouses(), backend.list_warehouses()),
        Collection::Suppliers => show!(columns::suppliers(), backend.list_suppliers()),
        Collection::Inventory => show!(columns::inventory(), backend.list_inventory()),
        Collection::History => show!(columns::history(), backend.stock_history()),
        Collection::Alerts => show!(columns::alerts(), backend.active_alerts()),
    }
}

fn print_metrics(metrics: &InventoryMetrics) {
    println!("total units:     {}", metrics.total_units);
    println!("total value:     {:.2}", metrics.total_value);
    println!("low stock:       {}", metrics.low_stock);
    println!("critical:        {}", metrics.critical);
    println!("warehouses:      {}", metrics.warehouses);
}

async fn metrics(
    session: &SessionManager,
    backend: &Arc<dyn InventoryBackend>,
    settings: &Settings,
    range: TimeRange,
) -> Result<()> {
    let role = session
        .wait_until_resolved()
        .await
        .role()
        .cloned()
        .ok_or_else(|| anyhow!("Please log in first."))?;

    match role {
        Role::Admin => {
            let mut dashboard = AdminDashboard::new(Arc::clone(backend));
            dashboard.load(session).await?;
            print_metrics(&dashboard.metrics());
            let counts = dashboard.role_counts();
            println!(
                "users:           {} ({} admin, {} manager, {} employee)",
                counts.total, counts.admins, counts.managers, counts.employees
            );
            println!("active alerts:   {}", dashboard.active_alerts().await.len());
        }
        Role::Manager => {
            let mut dashboard = ManagerDashboard::new(Arc::clone(backend));
            dashboard.thresholds = settings.thresholds();
            dashboard.time_range = range;
            dashboard.load(session).await?;
            print_metrics(&dashboard.metrics());
            let movement = dashboard.movement(chrono::Local::now().naive_local());
            println!(
                "movements:       {} in, {} out, {} total ({range:?})",
                movement.stock_in, movement.stock_out, movement.total
            );
        }
        Role::Employee => {
            let mut dashboard = EmployeeDashboard::new(Arc::clone(backend));
            dashboard.thresholds = settings.thresholds();
            dashboard.load(session).await?;
            print_metrics(&dashboard.metrics());
            for record in dashboard.low_stock() {
                println!(
                    "  low: {} @ {} = {}",
                    record.product_name(),
                    record.warehouse_name(),
                    record.stock_level.unwrap_or(0)
                );
            }
        }
        Role::Other(other) => bail!("no dashboard for role {other}"),
    }
    Ok(())
}

async fn consolidated(
    session: &SessionManager,
    backend: &Arc<dyn InventoryBackend>,
    spec: &SortSpec,
    export: Option<PathBuf>,
) -> Result<()> {
    let accessors = columns::product_totals();
    if !accessors.contains(&spec.field) {
        let known: Vec<_> = accessors.field_names().collect();
        bail!("unknown sort field '{}'; expected one of {}", spec.field, known.join(", "));
    }

    let role = session.wait_until_resolved().await.role().cloned();
    if role == Some(Role::Admin) {
        let mut details = WarehouseDetails::new(Arc::clone(backend));
        details.load(session).await?;
        if let Some(message) = details.inventory.error() {
            bail!("{message}");
        }
        println!("total stock value: {:.2}", details.total_value());
        for total in details.consolidated_sorted(spec) {
            println!(
                "{:<32} {:>8} x {:>10.2} = {:>12.2}",
                total.product.name,
                total.total,
                total.unit_price(),
                total.value()
            );
        }
        if let Some(out) = export {
            write_report(&details.export(), &out)?;
        }
        return Ok(());
    }

    if export.is_some() {
        bail!("only admins can export the warehouse inventory");
    }
    let mut dashboard = ManagerDashboard::new(Arc::clone(backend));
    dashboard.load(session).await?;
    for total in listing::sort(&dashboard.consolidated(), spec, &accessors) {
        println!(
            "{:<32} {:>8} in {} warehouse(s)",
            total.product.name, total.total, total.locations
        );
    }
    Ok(())
}

async fn adjust(
    session: &SessionManager,
    backend: &Arc<dyn InventoryBackend>,
    settings: &Settings,
    direction: StockDirection,
    args: StockArgs,
) -> Result<()> {
    let mut dashboard = EmployeeDashboard::new(Arc::clone(backend));
    dashboard.thresholds = settings.thresholds();
    dashboard.load(session).await?;

    let form = StockForm::new(ProductId(args.product), WarehouseId(args.warehouse), args.quantity);
    let message = dashboard.adjust_stock(direction, &form).await?;
    println!("{message}");
    print_metrics(&dashboard.metrics());
    Ok(())
}

async fn watch_alerts(
    session: &SessionManager,
    backend: &Arc<dyn InventoryBackend>,
    settings: &Settings,
    polls: Option<usize>,
) -> Result<()> {
    admit(session, &Role::Admin).await?;
    let alerts = Arc::new(Mutex::new(ListView::new(columns::alerts())));
    let poller = AlertPoller::spawn(
        Arc::clone(backend),
        Arc::clone(&alerts),
        settings.alert_poll_interval(),
    );
    let mut events = poller.subscribe();
    let mut seen = 0;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(AlertEvent::Refreshed { active }) => {
                    println!("{active} active alert(s)");
                    for alert in alerts.lock().await.sorted() {
                        println!(
                            "  {} @ {}: {}",
                            columns::alerts().read("product", alert),
                            columns::alerts().read("warehouse", alert),
                            alert.current_stock.unwrap_or(0)
                        );
                    }
                }
                Ok(AlertEvent::Failed { message }) => eprintln!("alert poll failed: {message}"),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
        seen += 1;
        if polls.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    poller.stop();
    Ok(())
}
