//! Profile Commands
//!
//! List, create, edit, delete and select stored profiles.

use clap::Args;
use serde::Serialize;

use crate::error::{AppError, CommandError, CommandResult};
use crate::models::{Profile, ProfileFields};
use crate::profiles::ProfileManager;
use crate::prompt::Prompt;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Default, Args)]
pub struct CreateProfileArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub age: String,
    #[arg(long, default_value = "")]
    pub sex: String,
    #[arg(long, default_value = "")]
    pub blood_group: String,
    /// Pre-existing conditions (free text)
    #[arg(long, default_value = "")]
    pub pre_cond: String,
}

/// Only the given fields change; the rest keep their current value.
#[derive(Debug, Clone, Default, Args)]
pub struct UpdateProfileArgs {
    /// Profile id
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub sex: Option<String>,
    #[arg(long)]
    pub blood_group: Option<String>,
    #[arg(long)]
    pub pre_cond: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

fn fail(error: impl Into<AppError>) -> CommandError {
    CommandError::from(error.into())
}

/// Guest entry first, then stored profiles in insertion order.
pub fn list_profiles<S: KeyValueStore, P: Prompt>(
    manager: &ProfileManager<S, P>,
) -> Vec<ProfileSummary> {
    let current = manager.current_id();
    let guest = Profile::guest();

    std::iter::once(&guest)
        .chain(manager.list().iter())
        .map(|p| ProfileSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            selected: p.id == current,
        })
        .collect()
}

pub async fn create_profile<S: KeyValueStore, P: Prompt>(
    manager: &mut ProfileManager<S, P>,
    args: CreateProfileArgs,
) -> CommandResult<Profile> {
    if args.name.trim().is_empty() {
        return Err(fail(AppError::InvalidOperation(
            "Profile name must not be empty.".to_string(),
        )));
    }

    let fields = ProfileFields {
        name: args.name.trim().to_string(),
        age: args.age,
        sex: args.sex,
        blood_group: args.blood_group,
        pre_cond: args.pre_cond,
    };
    manager.create(fields).await.map_err(fail)
}

pub async fn update_profile<S: KeyValueStore, P: Prompt>(
    manager: &mut ProfileManager<S, P>,
    args: UpdateProfileArgs,
) -> CommandResult<Profile> {
    let existing = manager.get(&args.id).map_err(fail)?;
    let mut fields = ProfileFields::from(&existing);

    if let Some(name) = args.name {
        if name.trim().is_empty() {
            return Err(fail(AppError::InvalidOperation(
                "Profile name must not be empty.".to_string(),
            )));
        }
        fields.name = name.trim().to_string();
    }
    if let Some(age) = args.age {
        fields.age = age;
    }
    if let Some(sex) = args.sex {
        fields.sex = sex;
    }
    if let Some(blood_group) = args.blood_group {
        fields.blood_group = blood_group;
    }
    if let Some(pre_cond) = args.pre_cond {
        fields.pre_cond = pre_cond;
    }

    manager.update(&args.id, fields).await.map_err(fail)
}

/// Returns `false` when the user declined the confirmation.
pub async fn delete_profile<S: KeyValueStore, P: Prompt>(
    manager: &mut ProfileManager<S, P>,
    id: &str,
    skip_confirmation: bool,
) -> CommandResult<bool> {
    if skip_confirmation {
        manager.delete(id).await.map_err(fail)?;
        return Ok(true);
    }
    manager.delete_with_confirmation(id).await.map_err(fail)
}

pub fn select_profile<S: KeyValueStore, P: Prompt>(
    manager: &mut ProfileManager<S, P>,
    id: &str,
) -> CommandResult<Profile> {
    manager.select(id).map_err(fail)?;
    Ok(manager.current())
}
