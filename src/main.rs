use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use gymbook::config::{
    config_dir, data_dir, load_config, open_roster, resolve_dir, CONFIG_TEMPLATE,
};
use gymbook::csv;
use gymbook::member::{describe_remaining, status_of, MemberCandidate, MemberId, MemberQuery};
use gymbook::store::{FileStore, MEMBERS_KEY};
use gymbook::{Config, GymError, Member, MembershipType, Result, Roster, Status};

#[derive(Parser)]
#[command(name = "gym")]
#[command(version, about = "Gym membership tracker", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.gym or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config
    Init,

    /// Add a new member
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: String,

        /// Membership type: Gym, "Muay Thai", "Muay Thai Kids" or Zumba
        #[arg(short = 't', long = "type", default_value = "Gym")]
        membership_type: String,

        /// Amount paid (default: 0)
        #[arg(short, long)]
        amount: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// Edit an existing member; omitted fields keep their value
    Edit {
        /// Member id or index from 'list' (e.g., 1 or lx3k9a2b7qz)
        member: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(short = 't', long = "type")]
        membership_type: Option<String>,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a member
    Delete {
        /// Member id or index from 'list'
        member: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// List members sorted by end date
    List {
        /// Search name or phone
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by membership type (or All)
        #[arg(short = 't', long = "type", default_value = "All")]
        membership_type: String,

        /// Filter by status: All, Active or Expired
        #[arg(long, default_value = "All")]
        status: String,

        /// Number of members to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a single member
    Show {
        /// Member id or index from 'list'
        member: String,
    },

    /// Import members from a CSV file (name,phone,type,amount,start,end)
    Import {
        file: PathBuf,
    },

    /// Export all members to a CSV file
    Export {
        /// Output file (default: export.output_dir/export.filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show membership totals
    Status,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Add {
            name,
            phone,
            membership_type,
            amount,
            start,
            end,
        } => {
            let (_, mut roster) = open(&cfg_dir)?;
            let candidate = MemberCandidate {
                name,
                phone,
                membership_type,
                amount: amount.unwrap_or_default(),
                start,
                end,
            };
            cmd_add(&mut roster, &candidate, now())
        }
        Commands::Edit {
            member,
            name,
            phone,
            membership_type,
            amount,
            start,
            end,
        } => {
            let (_, mut roster) = open(&cfg_dir)?;
            let id = resolve_member_id(&roster, &member, now())?;
            let patch = MemberPatch {
                name,
                phone,
                membership_type,
                amount,
                start,
                end,
            };
            cmd_edit(&mut roster, &id, patch, now())
        }
        Commands::Delete { member, yes } => {
            let (_, mut roster) = open(&cfg_dir)?;
            let id = resolve_member_id(&roster, &member, now())?;
            cmd_delete(&mut roster, &id, yes)
        }
        Commands::List {
            search,
            membership_type,
            status,
            limit,
        } => {
            let (config, roster) = open(&cfg_dir)?;
            let query = build_query(search, &membership_type, &status)?;
            cmd_list(&roster, &config, &query, limit, now())
        }
        Commands::Show { member } => {
            let (config, roster) = open(&cfg_dir)?;
            let id = resolve_member_id(&roster, &member, now())?;
            cmd_show(&roster, &config, &id, now())
        }
        Commands::Import { file } => {
            let (_, mut roster) = open(&cfg_dir)?;
            cmd_import(&mut roster, &file)
        }
        Commands::Export { output } => {
            let (config, roster) = open(&cfg_dir)?;
            cmd_export(&roster, &config, output)
        }
        Commands::Status => {
            let (config, roster) = open(&cfg_dir)?;
            cmd_status(&cfg_dir, &config, &roster, now())
        }
    }
}

/// WARN by default; RUST_LOG replaces it entirely (e.g. RUST_LOG=debug)
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Load config and the member roster from an initialized config directory
fn open(cfg_dir: &Path) -> Result<(Config, Roster<FileStore>)> {
    if !cfg_dir.exists() {
        return Err(GymError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    let config = load_config(cfg_dir)?;
    let roster = open_roster(cfg_dir, &config)?;
    Ok((config, roster))
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(GymError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("data"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized gym config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set your gym name:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Add a member:       gym add --name <name> --phone <phone> --start <date> --end <date>");
    println!("     or import a CSV:    gym import members.csv");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PHONE")]
    phone: String,
    #[tabled(rename = "TYPE")]
    membership_type: String,
    #[tabled(rename = "PAID")]
    paid: String,
    #[tabled(rename = "START")]
    start: String,
    #[tabled(rename = "END")]
    end: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "REMAINING")]
    remaining: String,
}

/// Fields given on the command line for an edit
struct MemberPatch {
    name: Option<String>,
    phone: Option<String>,
    membership_type: Option<String>,
    amount: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

impl MemberPatch {
    fn apply_to(self, mut candidate: MemberCandidate) -> MemberCandidate {
        if let Some(v) = self.name {
            candidate.name = v;
        }
        if let Some(v) = self.phone {
            candidate.phone = v;
        }
        if let Some(v) = self.membership_type {
            candidate.membership_type = v;
        }
        if let Some(v) = self.amount {
            candidate.amount = v;
        }
        if let Some(v) = self.start {
            candidate.start = v;
        }
        if let Some(v) = self.end {
            candidate.end = v;
        }
        candidate
    }
}

fn format_money(value: f64, currency_symbol: &str) -> String {
    format!("{}{:.2}", currency_symbol, value)
}

/// Members in the order 'list' numbers them: everyone, sorted by end date
fn numbered<'a>(roster: &'a Roster<FileStore>, now: NaiveDateTime) -> Vec<&'a Member> {
    roster.query(&MemberQuery::default(), now)
}

/// Resolve a member reference to its id.
/// Accepts either an index (1-based) from 'list' or the member id.
fn resolve_member_id(
    roster: &Roster<FileStore>,
    reference: &str,
    now: NaiveDateTime,
) -> Result<MemberId> {
    // Try to parse as an index first
    if let Ok(idx) = reference.parse::<usize>() {
        let members = numbered(roster, now);
        if idx == 0 || idx > members.len() {
            return Err(GymError::InvalidMemberIndex(reference.to_string()));
        }
        return Ok(members[idx - 1].id.clone());
    }

    // Otherwise, treat as an id - verify it exists
    let id = MemberId::from(reference);
    if roster.get(&id).is_some() {
        Ok(id)
    } else {
        Err(GymError::NotFound(reference.to_string()))
    }
}

fn build_query(text: String, membership_type: &str, status: &str) -> Result<MemberQuery> {
    let membership_type = if membership_type.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(membership_type.parse::<MembershipType>()?)
    };
    let status = if status.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(status.parse::<Status>()?)
    };
    Ok(MemberQuery {
        text,
        membership_type,
        status,
    })
}

fn print_member(member: &Member, config: &Config, now: NaiveDateTime) {
    println!("  ID:      {}", member.id);
    println!("  Name:    {}", member.name);
    println!("  Phone:   {}", member.phone);
    println!("  Type:    {}", member.membership_type);
    println!(
        "  Paid:    {}",
        format_money(member.amount_paid, &config.display.currency_symbol)
    );
    println!("  Start:   {}", member.start);
    println!("  End:     {}", member.end);
    println!(
        "  Status:  {} ({})",
        status_of(member, now),
        describe_remaining(member, now)
    );
}

/// Add a member
fn cmd_add(
    roster: &mut Roster<FileStore>,
    candidate: &MemberCandidate,
    now: NaiveDateTime,
) -> Result<()> {
    let member = roster.add(candidate)?;
    println!("Added {} ({})", member.name, member.id);
    println!(
        "  Status: {} ({})",
        status_of(member, now),
        describe_remaining(member, now)
    );
    Ok(())
}

/// Edit a member in place
fn cmd_edit(
    roster: &mut Roster<FileStore>,
    id: &MemberId,
    patch: MemberPatch,
    now: NaiveDateTime,
) -> Result<()> {
    let current = roster
        .get(id)
        .ok_or_else(|| GymError::NotFound(id.to_string()))?;
    let candidate = patch.apply_to(current.to_candidate());

    let member = roster.update(id, &candidate)?;
    println!("Updated {} ({})", member.name, member.id);
    println!(
        "  Status: {} ({})",
        status_of(member, now),
        describe_remaining(member, now)
    );
    Ok(())
}

/// Delete a member
fn cmd_delete(roster: &mut Roster<FileStore>, id: &MemberId, confirmed: bool) -> Result<()> {
    if !confirmed {
        return Err(GymError::ConfirmationRequired(id.to_string()));
    }
    match roster.remove(id)? {
        Some(member) => println!("Deleted {} ({})", member.name, member.id),
        None => println!("No member with id {id}"),
    }
    Ok(())
}

/// List members matching the filters
fn cmd_list(
    roster: &Roster<FileStore>,
    config: &Config,
    query: &MemberQuery,
    limit: Option<usize>,
    now: NaiveDateTime,
) -> Result<()> {
    if roster.is_empty() {
        println!("No members yet. Add one with 'gym add' or 'gym import'.");
        return Ok(());
    }

    let view = roster.query(query, now);
    if view.is_empty() {
        println!("No members found. Adjust your search filters.");
        println!("Total: {} members", roster.len());
        return Ok(());
    }

    let view = match limit {
        Some(n) => &view[..n.min(view.len())],
        None => &view[..],
    };

    // Index column always refers to the unfiltered list
    let numbering = numbered(roster, now);
    let rows: Vec<MemberRow> = view
        .iter()
        .map(|member| MemberRow {
            index: numbering
                .iter()
                .position(|m| m.id == member.id)
                .map_or(0, |i| i + 1),
            id: member.id.to_string(),
            name: member.name.clone(),
            phone: member.phone.clone(),
            membership_type: member.membership_type.to_string(),
            paid: format_money(member.amount_paid, &config.display.currency_symbol),
            start: member.start.to_string(),
            end: member.end.to_string(),
            status: status_of(member, now).to_string(),
            remaining: describe_remaining(member, now),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    println!();
    println!("Showing {} of {} members", view.len(), roster.len());
    println!("Use index number with show/edit/delete (e.g., 'gym show 1')");

    Ok(())
}

/// Show a single member
fn cmd_show(
    roster: &Roster<FileStore>,
    config: &Config,
    id: &MemberId,
    now: NaiveDateTime,
) -> Result<()> {
    let member = roster
        .get(id)
        .ok_or_else(|| GymError::NotFound(id.to_string()))?;
    println!("Member {}", member.name);
    print_member(member, config, now);
    Ok(())
}

/// Import members from a CSV file
fn cmd_import(roster: &mut Roster<FileStore>, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let import = csv::parse(&text)?;
    if import.count() == 0 {
        return Err(GymError::NoValidRows);
    }

    let skipped = import.skipped;
    let count = roster.bulk_import(import.members)?;
    println!("Imported {count} members");
    if skipped > 0 {
        println!("  Skipped {skipped} row(s) with missing or invalid fields");
    }
    Ok(())
}

/// Export all members to CSV
fn cmd_export(
    roster: &Roster<FileStore>,
    config: &Config,
    output: Option<PathBuf>,
) -> Result<()> {
    let path = match output {
        Some(p) => p,
        None => {
            let cwd = std::env::current_dir()?;
            let dir = resolve_dir(&config.export.output_dir, &cwd);
            fs::create_dir_all(&dir)?;
            dir.join(&config.export.filename)
        }
    };

    fs::write(&path, roster.export_csv())?;
    println!("Exported {} members to {}", roster.len(), path.display());
    Ok(())
}

/// Show membership totals
fn cmd_status(
    cfg_dir: &Path,
    config: &Config,
    roster: &Roster<FileStore>,
    now: NaiveDateTime,
) -> Result<()> {
    let summary = roster.summary(now);
    let store_path = FileStore::new(data_dir(cfg_dir, config)).path_for(MEMBERS_KEY);

    println!("{} Membership Status", config.gym.name);
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Member store:     {}", store_path.display());
    println!("Total:            {}", summary.total);
    println!("Active:           {}", summary.active);
    println!("Expired:          {}", summary.expired);

    let expiring: Vec<&Member> = roster
        .query(
            &MemberQuery {
                status: Some(Status::Active),
                ..Default::default()
            },
            now,
        )
        .into_iter()
        .take(5)
        .collect();
    if !expiring.is_empty() {
        println!();
        println!("Expiring next:");
        for member in expiring {
            println!(
                "  {} - {} - {}",
                member.name,
                member.end,
                describe_remaining(member, now)
            );
        }
    }

    Ok(())
}
