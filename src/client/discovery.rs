use super::api::MeetingApi;
use super::error::ClientResult;
use crate::model::MentorSummary;
use futures::future::join_all;
use tracing::warn;

/// Mentors with at least one skill containing `term`, ignoring case.
/// A blank term keeps everyone.
pub fn search_mentors(mentors: &[MentorSummary], term: &str) -> Vec<MentorSummary> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return mentors.to_vec();
    }

    mentors
        .iter()
        .filter(|mentor| {
            mentor
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Fetch the mentor list, filling in skills for entries that came back
/// without any. Lookups run concurrently; a failed lookup leaves that
/// mentor's skills empty.
pub async fn load_mentors<A: MeetingApi + ?Sized>(api: &A) -> ClientResult<Vec<MentorSummary>> {
    let mut mentors = api.mentors().await?;

    let missing: Vec<usize> = mentors
        .iter()
        .enumerate()
        .filter(|(_, m)| m.skills.is_empty())
        .map(|(i, _)| i)
        .collect();

    let lookups = missing.iter().map(|&i| api.mentor_skills(mentors[i].id));
    let results = join_all(lookups).await;

    for (i, result) in missing.into_iter().zip(results) {
        match result {
            Ok(skills) => mentors[i].skills = skills,
            Err(e) => warn!("Failed to fetch skills for mentor {}: {}", mentors[i].id, e),
        }
    }

    Ok(mentors)
}
