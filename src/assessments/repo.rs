use tracing::debug;
use uuid::Uuid;

use crate::assessments::repo_types::Assessment;
use crate::storage::{self, keys, StorageClient};

fn assessment_key(id: Uuid) -> String {
    format!("{}{}", keys::ASSESSMENTS, id)
}

/// Full overwrite by id; a new id is appended.
pub async fn save_assessment(
    storage: &dyn StorageClient,
    assessment: &Assessment,
) -> anyhow::Result<()> {
    storage::set_json(storage, &assessment_key(assessment.id), assessment).await?;
    debug!(assessment_id = %assessment.id, user_id = %assessment.user_id, "assessment saved");
    Ok(())
}

/// All assessments in insertion order, or only those owned by `user_id`.
pub async fn get_assessments(
    storage: &dyn StorageClient,
    user_id: Option<Uuid>,
) -> anyhow::Result<Vec<Assessment>> {
    if !storage.is_available() {
        return Ok(Vec::new());
    }
    let all: Vec<Assessment> = storage::list_json(storage, keys::ASSESSMENTS).await?;
    Ok(match user_id {
        Some(owner) => all.into_iter().filter(|a| a.user_id == owner).collect(),
        None => all,
    })
}

pub async fn get_assessment_by_id(
    storage: &dyn StorageClient,
    id: Uuid,
) -> anyhow::Result<Option<Assessment>> {
    if !storage.is_available() {
        return Ok(None);
    }
    storage::get_json(storage, &assessment_key(id)).await
}

/// Removing an unknown id is a no-op.
pub async fn delete_assessment(storage: &dyn StorageClient, id: Uuid) -> anyhow::Result<()> {
    storage.delete(&assessment_key(id)).await?;
    debug!(assessment_id = %id, "assessment deleted");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assessments::repo_types::{AiAnalysis, Measurements};
    use crate::storage::{MemoryStorage, SqliteStorage};
    use time::macros::datetime;

    pub(crate) fn assessment(user_id: Uuid) -> Assessment {
        Assessment {
            id: Uuid::new_v4(),
            user_id,
            date: datetime!(2024-06-01 09:15:30.25 UTC),
            photos: vec!["front.jpg".into(), "side.jpg".into()],
            measurements: Measurements {
                weight: Some(72.5),
                height: Some(178.0),
                waist: Some(81.25),
                ..Default::default()
            },
            ai_analysis: AiAnalysis {
                body_fat_percentage: Some(18.5),
                muscle_mass: None,
                recommendations: vec!["Increase protein intake".into()],
                overall_score: 7.5,
            },
            notes: Some("morning, fasted".into()),
        }
    }

    #[tokio::test]
    async fn saved_assessment_reads_back_equal() {
        let storage = MemoryStorage::new();
        let a = assessment(Uuid::new_v4());
        save_assessment(&storage, &a).await.unwrap();
        assert_eq!(get_assessment_by_id(&storage, a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn sparse_assessment_reads_back_equal_on_sqlite() {
        let storage = SqliteStorage::connect("sqlite::memory:").await.unwrap();
        let mut a = assessment(Uuid::new_v4());
        a.measurements = Measurements::default();
        a.notes = None;
        a.photos.clear();
        save_assessment(&storage, &a).await.unwrap();
        assert_eq!(get_assessment_by_id(&storage, a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn resaving_an_id_replaces_in_place() {
        let storage = MemoryStorage::new();
        let owner = Uuid::new_v4();
        let mut first = assessment(owner);
        let second = assessment(owner);
        save_assessment(&storage, &first).await.unwrap();
        save_assessment(&storage, &second).await.unwrap();

        first.notes = Some("edited".into());
        first.ai_analysis.overall_score = 8.0;
        save_assessment(&storage, &first).await.unwrap();

        let all = get_assessments(&storage, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], first);
        assert_eq!(all[1], second);
    }

    #[tokio::test]
    async fn filter_by_owner_keeps_insertion_order() {
        let storage = MemoryStorage::new();
        let ana = Uuid::new_v4();
        let bia = Uuid::new_v4();
        let a1 = assessment(ana);
        let b1 = assessment(bia);
        let a2 = assessment(ana);
        let a3 = assessment(ana);
        for a in [&a1, &b1, &a2, &a3] {
            save_assessment(&storage, a).await.unwrap();
        }

        let mine = get_assessments(&storage, Some(ana)).await.unwrap();
        assert_eq!(mine, vec![a1, a2, a3]);
        assert_eq!(get_assessments(&storage, Some(bia)).await.unwrap(), vec![b1]);
        assert!(get_assessments(&storage, Some(Uuid::new_v4())).await.unwrap().is_empty());
        assert_eq!(get_assessments(&storage, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn delete_removes_only_that_id() {
        let storage = MemoryStorage::new();
        let owner = Uuid::new_v4();
        let keep = assessment(owner);
        let gone = assessment(owner);
        save_assessment(&storage, &keep).await.unwrap();
        save_assessment(&storage, &gone).await.unwrap();

        delete_assessment(&storage, gone.id).await.unwrap();
        delete_assessment(&storage, Uuid::new_v4()).await.unwrap();

        assert!(get_assessment_by_id(&storage, gone.id).await.unwrap().is_none());
        assert_eq!(get_assessments(&storage, None).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn missing_backend_reads_as_empty() {
        let storage = MemoryStorage::new();
        let a = assessment(Uuid::new_v4());
        save_assessment(&storage, &a).await.unwrap();
        storage.set_available(false);
        assert!(get_assessments(&storage, None).await.unwrap().is_empty());
        assert!(get_assessment_by_id(&storage, a.id).await.unwrap().is_none());
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let a = assessment(Uuid::new_v4());
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("userId").is_some());
        assert_eq!(json["aiAnalysis"]["overallScore"], 7.5);
        assert_eq!(json["measurements"]["weight"], 72.5);
        assert!(json["measurements"].get("chest").is_none());
        assert_eq!(json["date"], "2024-06-01T09:15:30.25Z");
    }
}
