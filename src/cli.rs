use crate::config::load_config;
use crate::editor::{Command, CommandOutcome, Editor};
use crate::model::{Document, LayoutMode, Position};
use crate::persist::JsonFileStore;
use crate::theme::NodeColor;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mmap", version, about = "Edit nested mind maps from the command line")]
pub struct Args {
    /// State file holding every document
    #[arg(short = 's', long = "state", default_value = "mindmap.json")]
    pub state: PathBuf,

    /// Editor config JSON file (placement, collision and layout constants)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Print the document tree and the active graph
    Show,
    /// Create a top-level document and open it
    New {
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Add an unconnected node at a position
    AddNode {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f32,
    },
    AddChild { node: String },
    AddParent { node: String },
    AddSibling { node: String },
    Duplicate { node: String },
    Delete { node: String },
    /// Toggle whether a node opens a nested document
    Portal { node: String },
    Connect { source: String, target: String },
    Label { node: String, text: String },
    Color { node: String, color: String },
    /// Switch layout mode (mindmap, orgchart, logic)
    Mode { mode: String },
    /// Run the automatic layered layout on the active document
    Layout,
    Undo,
    Redo,
    /// Make a document active
    Open { document: String },
    /// Descend into a portal node's document
    Enter { node: String },
    /// Return to the enclosing document
    Back,
    Rename { document: String, name: String },
    Pin { document: String },
    DeleteDocument { document: String },
    /// Write the active graph as JSON (stdout when no output is given)
    Export {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Replace the active graph with a JSON file ('-' for stdin)
    Import { input: PathBuf },
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let mut store = JsonFileStore::new(&args.state);
    let mut editor = Editor::load(&store, config)?;

    apply(&mut editor, args.action)?;

    editor
        .flush_autosave(&mut store)
        .with_context(|| format!("saving {}", store.path().display()))?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply(editor: &mut Editor, action: Action) -> Result<()> {
    let outcome = match action {
        Action::Show => {
            print!("{}", describe(editor));
            return Ok(());
        }
        Action::New { name } => {
            let id = editor.create_document(name.as_deref(), None, None)?;
            println!("{id}");
            return Ok(());
        }
        Action::AddNode { x, y } => editor.dispatch(Command::AddRootNode(Position::new(x, y)))?,
        Action::AddChild { node } => editor.dispatch(Command::AddChild(node))?,
        Action::AddParent { node } => editor.dispatch(Command::AddParent(node))?,
        Action::AddSibling { node } => editor.dispatch(Command::AddSibling(node))?,
        Action::Duplicate { node } => editor.dispatch(Command::Duplicate(node))?,
        Action::Delete { node } => editor.dispatch(Command::Delete(node))?,
        Action::Portal { node } => editor.dispatch(Command::TogglePortal(node))?,
        Action::Connect { source, target } => {
            editor.dispatch(Command::Connect { source, target })?
        }
        Action::Label { node, text } => {
            editor.update_label(&node, &text)?;
            return Ok(());
        }
        Action::Color { node, color } => {
            let color = NodeColor::from_token(&color)
                .ok_or_else(|| anyhow::anyhow!("unknown color `{color}`"))?;
            editor.set_color(&node, color)?;
            return Ok(());
        }
        Action::Mode { mode } => {
            let mode = LayoutMode::from_token(&mode)
                .ok_or_else(|| anyhow::anyhow!("unknown layout mode `{mode}`"))?;
            editor.set_layout_mode(mode);
            return Ok(());
        }
        Action::Layout => editor.dispatch(Command::AutoLayout)?,
        Action::Undo => editor.dispatch(Command::Undo)?,
        Action::Redo => editor.dispatch(Command::Redo)?,
        Action::Open { document } => {
            editor.set_active_document(&document)?;
            return Ok(());
        }
        Action::Enter { node } => {
            println!("{}", editor.enter_portal(&node)?);
            return Ok(());
        }
        Action::Back => {
            match editor.pop_breadcrumb() {
                Some(id) => println!("{id}"),
                None => println!("already at the top level"),
            }
            return Ok(());
        }
        Action::Rename { document, name } => {
            editor.rename_document(&document, &name)?;
            return Ok(());
        }
        Action::Pin { document } => {
            let pinned = editor.toggle_pin(&document)?;
            println!("{}", if pinned { "pinned" } else { "unpinned" });
            return Ok(());
        }
        Action::DeleteDocument { document } => {
            for id in editor.delete_document(&document)? {
                println!("removed {id}");
            }
            return Ok(());
        }
        Action::Export { output } => {
            let json = editor.export_document()?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{json}"),
            }
            return Ok(());
        }
        Action::Import { input } => {
            let payload = read_input(&input)?;
            editor.import_document(&payload)?;
            return Ok(());
        }
    };
    report(&outcome);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn report(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::NodeCreated(id) => println!("{id}"),
        CommandOutcome::EdgeCreated(Some(id)) => println!("{id}"),
        CommandOutcome::EdgeCreated(None) => println!("already connected"),
        CommandOutcome::NodeDeleted => {}
        CommandOutcome::PortalToggled {
            document_id: Some(id),
            ..
        } => println!("{id}"),
        CommandOutcome::PortalToggled { .. } => println!("portal cleared"),
        CommandOutcome::LayoutApplied(outcome) => println!("{outcome:?}"),
        CommandOutcome::HistoryStep(applied) => {
            if !applied {
                println!("nothing to apply");
            }
        }
    }
}

fn describe(editor: &Editor) -> String {
    let mut out = String::new();
    let workspace = editor.workspace();
    let active = workspace.active_id();
    out.push_str(&format!("mode: {:?}\n", editor.layout_mode()));
    out.push_str(&format!("path: {}\n", workspace.breadcrumb().join(" > ")));
    describe_group(editor, None, 0, active, &mut out);

    if let Ok(doc) = editor.active_document() {
        out.push_str(&format!(
            "\n{} ({} nodes, {} edges)\n",
            doc.name,
            doc.nodes.len(),
            doc.edges.len()
        ));
        for node in &doc.nodes {
            let portal = if node.is_portal { " [portal]" } else { "" };
            out.push_str(&format!(
                "  {} \"{}\" @ ({:.1}, {:.1}) {}{}\n",
                node.id,
                node.label,
                node.position.x,
                node.position.y,
                node.color.as_str(),
                portal
            ));
        }
        for edge in &doc.edges {
            out.push_str(&format!("  {}: {} -> {}\n", edge.id, edge.source, edge.target));
        }
    }
    out
}

fn describe_group(
    editor: &Editor,
    parent: Option<&str>,
    depth: usize,
    active: Option<&str>,
    out: &mut String,
) {
    let children: Vec<&Document> = editor.workspace().child_documents(parent);
    for doc in children {
        let marker = if Some(doc.id.as_str()) == active { "*" } else { " " };
        let pin = if doc.pinned { " (pinned)" } else { "" };
        out.push_str(&format!(
            "{marker} {}{} [{}]{pin}\n",
            "  ".repeat(depth),
            doc.name,
            doc.id
        ));
        describe_group(editor, Some(&doc.id), depth + 1, active, out);
    }
}
