//! Absolute image URLs for match posters and team badges.

use std::path::Path;

use crate::core::models::{RawTeam, TeamSide};

const IMAGE_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg", "svg"];

fn has_extension(value: &str) -> bool {
    Path::new(value).extension().is_some()
}

fn has_image_extension(value: &str) -> bool {
    Path::new(value)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn is_absolute(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn is_image_path(value: &str) -> bool {
    value.starts_with("api/images/") || value.starts_with("images/")
}

/// Poster URL rooted at `image_base`. Extensionless paths get `.webp`.
#[must_use]
pub fn poster_url(image_base: &str, poster: Option<&str>) -> Option<String> {
    let cleaned = poster.map(str::trim).filter(|p| !p.is_empty())?;
    let base = image_base.trim_end_matches('/');
    if is_absolute(cleaned) {
        return Some(cleaned.to_string());
    }
    if cleaned.starts_with('/') || is_image_path(cleaned) {
        let mut path = format!("/{}", cleaned.trim_start_matches('/'));
        if !has_extension(&path) {
            path.push_str(".webp");
        }
        return Some(format!("{base}{path}"));
    }
    if has_image_extension(cleaned) {
        Some(format!("{base}/api/images/proxy/{cleaned}"))
    } else {
        Some(format!("{base}/api/images/proxy/{cleaned}.webp"))
    }
}

/// Badge URL rooted at `image_base`.
#[must_use]
pub fn badge_url(image_base: &str, badge: Option<&str>) -> Option<String> {
    let cleaned = badge.map(str::trim).filter(|b| !b.is_empty())?;
    let base = image_base.trim_end_matches('/');
    if is_absolute(cleaned) {
        return Some(cleaned.to_string());
    }
    if cleaned.starts_with('/') {
        return Some(format!("{base}{cleaned}"));
    }
    if is_image_path(cleaned) {
        return Some(format!("{base}/{cleaned}"));
    }
    if has_image_extension(cleaned) {
        Some(format!("{base}/api/images/badge/{cleaned}"))
    } else {
        Some(format!("{base}/api/images/badge/{cleaned}.webp"))
    }
}

/// Team side with an absolute logo, or `None` when both name and logo are empty.
#[must_use]
pub fn team_side(image_base: &str, team: Option<&RawTeam>) -> Option<TeamSide> {
    let team = team?;
    let name = team.name.clone().unwrap_or_default();
    let badge = team
        .badge
        .as_deref()
        .filter(|b| !b.is_empty())
        .or(team.logo.as_deref());
    let logo = badge_url(image_base, badge);
    if name.is_empty() && logo.is_none() {
        return None;
    }
    Some(TeamSide { name, logo })
}
