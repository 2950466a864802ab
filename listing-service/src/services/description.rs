//! Prompt construction and completion post-processing for `/generate`.

use crate::models::{CarfaxSignal, GenerationRequest, VehicleRecord};
use crate::services::providers::{GenerationParams, TextProvider};
use service_core::error::AppError;
use std::fmt::Write;

/// Appended verbatim when the disclaimer is enabled.
pub const DEALER_DISCLAIMER: &str = "\
All vehicles are subject to prior sale. Prices exclude tax, title, license, \
dealer documentation fees and any applicable finance charges.

While every effort is made to ensure the accuracy of this listing, options, \
equipment and mileage are provided by the dealer and may contain errors. \
Please verify all information with a sales representative before purchase.

Vehicle history reports are provided by a third party. The dealer is not \
responsible for inaccuracies in third-party reports.";

const PROMPT_HEADER: &str = "\
You are a professional automotive copywriter. Write engaging, neutral, and confident descriptions for used vehicles.
Rules:
- Begin the first sentence with the important options provided.
- If the options include \"Clean Carfax\" or \"Carfax 1 Owner\", put that first.
- Mention drivetrain only if it is AWD or 4WD.
- Do not mention vehicle condition.
- Do not invent Carfax, accident or condition details that were not provided.
- List the options as given, title-cased, without adding adjectives to them.
- Avoid hype or assumptions. Keep the copy factual and friendly.
";

/// Render the copywriter prompt for a vehicle and the options to highlight.
pub fn build_prompt(vehicle: &VehicleRecord, options: &str) -> String {
    let mut prompt = String::from(PROMPT_HEADER);

    let _ = writeln!(
        prompt,
        "\nVehicle: {} {} {} {}",
        vehicle.year, vehicle.make, vehicle.model, vehicle.trim
    );
    let _ = writeln!(prompt, "Mileage: {} miles", vehicle.mileage);
    let _ = writeln!(prompt, "Transmission: {}", vehicle.transmission);
    if vehicle.advertises_drivetrain() {
        let _ = writeln!(prompt, "Drivetrain: {}", vehicle.drivetrain);
    }
    let _ = writeln!(prompt, "Important features: {}", options);
    prompt.push_str("\nWrite a 3-4 sentence description.\n");

    prompt
}

/// Trim the raw completion, prefix the Carfax label and append the disclaimer.
pub fn finalize_description(
    completion: &str,
    carfax: Option<CarfaxSignal>,
    append_disclaimer: bool,
) -> String {
    let mut description = String::new();
    if let Some(signal) = carfax {
        description.push_str(signal.label());
    }
    description.push_str(completion.trim());

    if append_disclaimer {
        description.push_str("\n\n");
        description.push_str(DEALER_DISCLAIMER);
    }

    description
}

/// Run the full generation step for a resolved vehicle.
pub async fn generate_description(
    provider: &dyn TextProvider,
    params: &GenerationParams,
    vehicle: &VehicleRecord,
    request: &GenerationRequest,
    append_disclaimer: bool,
) -> Result<String, AppError> {
    let prompt = build_prompt(vehicle, &request.options);

    let result = provider.generate(&prompt, params).await;
    metrics::counter!(
        "descriptions_generated_total",
        "provider" => provider.name(),
        "outcome" => if result.is_ok() { "ok" } else { "error" }
    )
    .increment(1);

    let response = result.map_err(|e| AppError::GenerationError(anyhow::Error::new(e)))?;

    tracing::info!(
        stock = %request.stock_number,
        provider = provider.name(),
        model = %params.model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        finish_reason = ?response.finish_reason,
        "Generated description"
    );

    Ok(finalize_description(
        &response.text,
        request.carfax,
        append_disclaimer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;

    fn vehicle(drivetrain: &str) -> VehicleRecord {
        VehicleRecord {
            year: "2020".into(),
            make: "Toyota".into(),
            model: "RAV4".into(),
            trim: "XLE".into(),
            drivetrain: drivetrain.into(),
            mileage: "41000".into(),
            transmission: "Automatic".into(),
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            model: "mock-copywriter".to_string(),
            temperature: 0.7,
            max_tokens: 300,
        }
    }

    #[test]
    fn prompt_embeds_vehicle_and_options() {
        let prompt = build_prompt(&vehicle("FWD"), "heated seats, sunroof");
        assert!(prompt.contains("Vehicle: 2020 Toyota RAV4 XLE"));
        assert!(prompt.contains("Mileage: 41000 miles"));
        assert!(prompt.contains("Transmission: Automatic"));
        assert!(prompt.contains("Important features: heated seats, sunroof"));
        assert!(prompt.contains("Write a 3-4 sentence description."));
    }

    #[test]
    fn drivetrain_line_only_for_awd_and_4wd() {
        for (drivetrain, included) in [
            ("AWD", true),
            ("4WD", true),
            ("awd", true),
            ("FWD", false),
            ("RWD", false),
            ("fwd", false),
        ] {
            let prompt = build_prompt(&vehicle(drivetrain), "sunroof");
            assert_eq!(
                prompt.contains(&format!("Drivetrain: {}", drivetrain)),
                included,
                "{drivetrain}"
            );
        }
    }

    #[test]
    fn clean_carfax_label_is_prefixed() {
        assert_eq!(
            finalize_description("  Great car.\n", Some(CarfaxSignal::Clean), false),
            "Clean Carfax. Great car."
        );
        assert_eq!(
            finalize_description("Great car.", Some(CarfaxSignal::OneOwner), false),
            "Carfax 1 Owner. Great car."
        );
    }

    #[test]
    fn no_signal_leaves_completion_trimmed_only() {
        assert_eq!(finalize_description("  Great car.  ", None, false), "Great car.");
    }

    #[test]
    fn disclaimer_is_appended_verbatim() {
        let description = finalize_description("Great car.", None, true);
        assert_eq!(description, format!("Great car.\n\n{}", DEALER_DISCLAIMER));
    }

    #[tokio::test]
    async fn generate_description_post_processes_completion() {
        let provider = MockTextProvider::with_completion("\n Great car. \n");
        let request = GenerationRequest {
            stock_number: "A1".into(),
            options: "Clean Carfax, sunroof".into(),
            carfax: Some(CarfaxSignal::Clean),
        };

        let description =
            generate_description(&provider, &params(), &vehicle("AWD"), &request, false)
                .await
                .unwrap();
        assert_eq!(description, "Clean Carfax. Great car.");
    }

    #[tokio::test]
    async fn provider_failure_is_generation_error() {
        let provider = MockTextProvider::new(false);
        let request = GenerationRequest {
            stock_number: "A1".into(),
            options: "sunroof".into(),
            carfax: None,
        };

        let err = generate_description(&provider, &params(), &vehicle("AWD"), &request, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationError(_)));
    }
}
