//! Baseline image selection.
//!
//! When an inspection is created it is paired with one baseline image of the
//! same transformer. The policy is first-match in list order: an exact
//! condition match wins, otherwise the earliest baseline of the transformer.

use crate::model::Image;

/// Baseline images of one transformer, in list order.
pub fn baselines_for<'a, 'b>(
    images: &'a [Image],
    transformer_id: &'b str,
) -> impl Iterator<Item = &'a Image> + 'b
where
    'a: 'b,
{
    images
        .iter()
        .filter(move |im| im.transformer_id == transformer_id && im.is_baseline())
}

/// Pick the baseline image to compare an inspection against.
///
/// Returns the first baseline of `transformer_id` whose condition equals
/// `condition`, else the first baseline of that transformer, else `None`.
#[must_use]
pub fn select_baseline<'a>(
    images: &'a [Image],
    transformer_id: &str,
    condition: &str,
) -> Option<&'a Image> {
    let mut fallback = None;
    for image in baselines_for(images, transformer_id) {
        if image.condition.as_deref() == Some(condition) {
            return Some(image);
        }
        if fallback.is_none() {
            fallback = Some(image);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageType;

    fn image(id: &str, transformer: &str, kind: ImageType, condition: Option<&str>) -> Image {
        Image {
            id: id.to_string(),
            transformer_id: transformer.to_string(),
            kind,
            uploader: "ops".to_string(),
            upload_date: "2024-01-01 08:00:00".to_string(),
            name: format!("{id}.png"),
            data_url: "data:image/png;base64,AA".to_string(),
            condition: condition.map(ToString::to_string),
        }
    }

    fn fixture() -> Vec<Image> {
        vec![
            image("M0", "T", ImageType::Maintenance, Some("Normal")),
            image("B1", "T", ImageType::Baseline, Some("Oil Leak")),
            image("X1", "T9", ImageType::Baseline, Some("Normal")),
            image("B2", "T", ImageType::Baseline, Some("Normal")),
        ]
    }

    #[test]
    fn test_exact_condition_match() {
        let images = fixture();
        let chosen = select_baseline(&images, "T", "Normal").unwrap();
        assert_eq!(chosen.id, "B2");
    }

    #[test]
    fn test_falls_back_to_first_baseline() {
        let images = fixture();
        let chosen = select_baseline(&images, "T", "Overheat").unwrap();
        assert_eq!(chosen.id, "B1");
    }

    #[test]
    fn test_no_baselines_for_transformer() {
        let images = fixture();
        assert!(select_baseline(&images, "T2", "Normal").is_none());
        assert!(select_baseline(&[], "T", "Normal").is_none());
    }

    #[test]
    fn test_maintenance_images_never_match() {
        let images = vec![image("M1", "T", ImageType::Maintenance, Some("Normal"))];
        assert!(select_baseline(&images, "T", "Normal").is_none());
    }

    #[test]
    fn test_earliest_wins_among_equal_conditions() {
        let images = vec![
            image("B1", "T", ImageType::Baseline, None),
            image("B2", "T", ImageType::Baseline, Some("Normal")),
            image("B3", "T", ImageType::Baseline, Some("Normal")),
        ];
        assert_eq!(select_baseline(&images, "T", "Normal").unwrap().id, "B2");
    }

    #[test]
    fn test_baseline_without_condition_is_fallback_only() {
        let images = vec![image("B1", "T", ImageType::Baseline, None)];
        assert_eq!(select_baseline(&images, "T", "Normal").unwrap().id, "B1");
    }

    #[test]
    fn test_condition_match_is_exact() {
        let images = vec![
            image("B1", "T", ImageType::Baseline, Some("Oil Leak")),
            image("B2", "T", ImageType::Baseline, Some("normal")),
        ];
        assert_eq!(select_baseline(&images, "T", "Normal").unwrap().id, "B1");
    }

    #[test]
    fn test_baselines_for_filters_and_keeps_order() {
        let images = fixture();
        let ids: Vec<&str> = baselines_for(&images, "T").map(|im| im.id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "B2"]);
    }
}
