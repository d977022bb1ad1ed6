use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::{App, DraftField, Location, RouteName};
use colored::Colorize;
use shared::models::{
    Choice, ListQuery, SortOrder, SurveyDraft, SurveyState, SurveySummary, find_template,
};
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum SurveysCommand {
    /// List your surveys
    List {
        #[arg(long, short)]
        limit: Option<u32>,
        /// Field to sort by (e.g., `created_at`)
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, value_parser = parse_order)]
        order: Option<SortOrder>,
    },
    /// Show a survey as stored, with choice ids
    Show { uuid: String },
    /// Show the public voting view of a survey (no session needed)
    View { uuid: String },
    /// Create a survey, optionally seeded from a template
    Create(CreateArgs),
    /// Edit a stored survey
    Edit(EditArgs),
    /// Close a survey for voting
    Finalize { uuid: String },
    /// Change the state of a survey
    State {
        uuid: String,
        #[arg(value_parser = parse_state)]
        state: SurveyState,
    },
    /// Delete a survey
    Delete { uuid: String },
    /// Print the public voting link of a survey
    Share { uuid: String },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Template key (see `votacion templates`)
    #[arg(long, short)]
    pub template: Option<String>,
    #[arg(long, short)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    /// Extra choice, may be repeated
    #[arg(long = "choice")]
    pub choices: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub uuid: String,
    #[arg(long, short)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    /// Choice to append, may be repeated
    #[arg(long = "add-choice")]
    pub add: Vec<String>,
    /// `INDEX=TITLE` replacing the title of a choice, may be repeated
    #[arg(long = "rename-choice", value_parser = parse_rename)]
    pub rename: Vec<(usize, String)>,
    /// Index of a choice to remove, may be repeated (applied last, highest first)
    #[arg(long = "remove-choice")]
    pub remove: Vec<usize>,
}

pub async fn run(app: &App, command: SurveysCommand) -> Result<()> {
    match command {
        SurveysCommand::View { uuid } => view(app, &uuid).await,
        SurveysCommand::Share { uuid } => {
            println!("{}", app.share_link(&uuid)?);
            Ok(())
        }
        command => {
            require_session(app, RouteName::EncuestasRealizadas)?;
            run_protected(app, command).await
        }
    }
}

async fn run_protected(app: &App, command: SurveysCommand) -> Result<()> {
    match command {
        SurveysCommand::List { limit, sort, order } => {
            let surveys = app.surveys.fetch(&ListQuery { limit, sort, order }).await?;
            if surveys.is_empty() {
                println!("No surveys yet.");
            }
            for survey in &surveys {
                print_summary(survey);
            }
        }
        SurveysCommand::Show { uuid } => {
            let draft = app.draft.load(&uuid).await?;
            print_draft(&draft);
        }
        SurveysCommand::Create(args) => create(app, args).await?,
        SurveysCommand::Edit(args) => edit(app, args).await?,
        SurveysCommand::Finalize { uuid } => {
            app.draft.finalize(&uuid).await?;
            println!("Survey {uuid} {}.", "finalized".green());
        }
        SurveysCommand::State { uuid, state } => {
            // Fill the cache so the transition can be checked locally.
            app.surveys.fetch(&ListQuery::default()).await?;
            app.surveys.update_state(&uuid, state).await?;
            println!("Survey {uuid} is now {state}.");
        }
        SurveysCommand::Delete { uuid } => {
            app.surveys.delete(&uuid).await?;
            println!("Survey {uuid} deleted.");
        }
        SurveysCommand::View { .. } | SurveysCommand::Share { .. } => {}
    }
    Ok(())
}

async fn view(app: &App, uuid: &str) -> Result<()> {
    let location = app
        .router
        .navigate(Location::new(RouteName::Votacion).with_param("uuid", uuid));
    debug!(%location, "opening voting page");
    let survey = app.surveys.fetch_public(uuid).await?;
    println!("{} [{}]", survey.name.bold(), survey.state);
    if let Some(description) = &survey.description {
        println!("{description}");
    }
    for (index, choice) in survey.choices.iter().enumerate() {
        println!("  {}. {}", index + 1, choice.content);
    }
    Ok(())
}

async fn create(app: &App, args: CreateArgs) -> Result<()> {
    require_session(app, RouteName::CrearVotacion)?;
    match args.template.as_deref() {
        Some(key) => {
            let template =
                find_template(key).with_context(|| format!("unknown template '{key}'"))?;
            app.draft.initialize_from_template(&template);
        }
        None => app.draft.clear(),
    }
    if let Some(name) = args.name {
        app.draft.update_field(DraftField::Name(name));
    }
    if let Some(description) = args.description {
        app.draft.update_field(DraftField::Description(description));
    }
    for title in args.choices {
        app.draft.add_choice(Some(Choice::new(title, None)));
    }
    if app.draft.draft().name.trim().is_empty() {
        bail!("a survey needs a name: pass --name or --template");
    }

    let uuid = app.draft.save().await?;
    println!("Created survey {}", uuid.bold());
    println!("share link: {}", app.share_link(&uuid)?);
    Ok(())
}

async fn edit(app: &App, args: EditArgs) -> Result<()> {
    app.draft.load(&args.uuid).await?;
    if let Some(name) = args.name {
        app.draft.update_field(DraftField::Name(name));
    }
    if let Some(description) = args.description {
        app.draft.update_field(DraftField::Description(description));
    }
    if let Some(icon) = args.icon {
        app.draft.update_field(DraftField::Icon(icon));
    }
    for (index, title) in args.rename {
        let image = app
            .draft
            .draft()
            .choices
            .get(index)
            .and_then(|choice| choice.image.clone());
        app.draft.update_choice(index, title, image)?;
    }
    let mut removals = args.remove;
    removals.sort_unstable();
    removals.dedup();
    for index in removals.into_iter().rev() {
        let removed = app.draft.remove_choice(index)?;
        println!("removed choice {}: {}", index, removed.title);
    }
    for title in args.add {
        app.draft.add_choice(Some(Choice::new(title, None)));
    }

    let uuid = app.draft.save().await?;
    println!("Saved survey {}", uuid.bold());
    Ok(())
}

/// Runs the navigation guard for `route` and fails when it sends us to the
/// entry page.
fn require_session(app: &App, route: RouteName) -> Result<()> {
    let reached = app.router.navigate(Location::new(route));
    if reached.name != route {
        bail!("not logged in. Run `votacion login` first");
    }
    Ok(())
}

fn print_summary(survey: &SurveySummary) {
    let state = match survey.state {
        SurveyState::Enabled => survey.state.to_string().green(),
        SurveyState::Disabled => survey.state.to_string().red(),
        SurveyState::Pending => survey.state.to_string().yellow(),
    };
    print!("{}  {:<9} {}", survey.uuid, state, survey.name);
    if let Some(votes) = survey.total_votes {
        print!("  ({votes} votes)");
    }
    println!();
}

fn print_draft(draft: &SurveyDraft) {
    println!(
        "{} [{}] {}",
        draft.name.bold(),
        draft.state,
        draft.icon.dimmed()
    );
    if !draft.description.is_empty() {
        println!("{}", draft.description);
    }
    for (index, choice) in draft.choices.iter().enumerate() {
        let id = choice.id.as_deref().unwrap_or("-");
        println!("  {index}. {} (id {id})", choice.title);
    }
}

fn parse_state(value: &str) -> Result<SurveyState, String> {
    value
        .parse()
        .map_err(|_| format!("unknown state '{value}'. Use pending, enabled or disabled"))
}

fn parse_order(value: &str) -> Result<SortOrder, String> {
    value
        .parse()
        .map_err(|_| format!("unknown order '{value}'. Use asc or desc"))
}

fn parse_rename(value: &str) -> Result<(usize, String), String> {
    let (index, title) = value
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=TITLE, got '{value}'"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid choice index '{index}'"))?;
    Ok((index, title.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename() {
        assert_eq!(parse_rename("2=Tacos"), Ok((2, "Tacos".to_string())));
        assert_eq!(parse_rename("0=a=b"), Ok((0, "a=b".to_string())));
        assert!(parse_rename("Tacos").is_err());
        assert!(parse_rename("x=Tacos").is_err());
    }

    #[test]
    fn test_parse_state_is_case_insensitive() {
        assert_eq!(parse_state("Disabled"), Ok(SurveyState::Disabled));
        assert!(parse_state("closed").is_err());
    }
}
