use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration file to stdout
    Config,

    /// Search packages by name and summary
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s", visible_alias = "find")]
    Search {
        /// Patterns to search for
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Also search description and url, matching any pattern
        #[arg(required = false, long)]
        all: bool,

        /// Search every version instead of the latest one
        #[arg(required = false, long, alias = "show-duplicates")]
        showduplicates: bool,

        /// Limit number of printed packages
        #[arg(required = false, long)]
        limit: Option<usize>,
    },

    /// Query packages matching specs and filters
    #[clap(name = "query", visible_alias = "Q", visible_alias = "repoquery")]
    Query {
        /// Package specs to resolve; every package when empty
        specs: Vec<String>,

        /// Filter by package name
        #[arg(required = false, long)]
        name: Vec<String>,

        /// Filter by architecture
        #[arg(required = false, long, value_delimiter = ',')]
        arch: Vec<String>,

        /// Filter by repository
        #[arg(required = false, long, value_delimiter = ',')]
        repo: Vec<String>,

        /// Filter by [epoch:]version-release
        #[arg(required = false, long)]
        evr: Vec<String>,

        /// Comparator used by --name, --arch and --repo
        #[arg(required = false, long, default_value = "eq")]
        cmp: String,

        /// Comparator used by --evr (eq, neq, lt, lte, gt, gte)
        #[arg(required = false, long, default_value = "eq")]
        evr_cmp: String,

        /// Keep packages providing the given capabilities
        #[arg(required = false, long)]
        whatprovides: Vec<String>,

        /// Keep packages requiring the given capabilities
        #[arg(required = false, long)]
        whatrequires: Vec<String>,

        /// Keep packages owning the given files
        #[arg(required = false, long, value_hint = ValueHint::AnyPath)]
        file: Vec<String>,

        /// Keep the N newest versions per name and arch; negative drops the N newest
        #[arg(required = false, long, allow_negative_numbers = true)]
        latest_limit: Option<i64>,

        /// Keep packages with more than one version per name and arch
        #[arg(required = false, long)]
        duplicates: bool,
    },

    /// Show how a package spec is resolved
    #[command(arg_required_else_help = true)]
    #[clap(name = "resolve")]
    Resolve {
        /// Package spec
        #[arg(required = true)]
        spec: String,

        /// Match case-insensitively
        #[arg(required = false, short, long)]
        ignore_case: bool,

        /// Don't resolve against provides
        #[arg(required = false, long)]
        no_provides: bool,

        /// Don't resolve against file lists
        #[arg(required = false, long)]
        no_filenames: bool,

        /// Don't resolve as a binary in /usr/bin or /usr/sbin
        #[arg(required = false, long)]
        no_binaries: bool,

        /// Exclude source packages
        #[arg(required = false, long)]
        no_src: bool,
    },

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,
}
