// Lambda adapter: GB-seconds, requests, provisioned concurrency

use crate::adapters::{require_region, AdapterContext, UsageAdapter};
use crate::errors::Result;
use crate::mode::HOURS_PER_MONTH;
use crate::model::{Confidence, Resource, UsageVector};

const SERVICE: &str = "AWSLambda";

pub struct LambdaAdapter;

impl UsageAdapter for LambdaAdapter {
    fn name(&self) -> &'static str {
        "lambda"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_lambda_function"
    }

    fn extract(&self, resource: &Resource, ctx: &AdapterContext) -> Result<Vec<UsageVector>> {
        let region = require_region(resource)?;

        let memory_mb = resource.num_attr("memory_size").unwrap_or(128.0);
        let memory_gb = memory_mb / 1024.0;
        let requests = ctx.mode.lambda_monthly_requests(&resource.address)?;
        let duration_secs = ctx.mode.lambda_avg_duration_secs(&resource.address)?;
        let gb_seconds = requests * duration_secs * memory_gb;

        let usage_note = format!(
            "assumed {requests} requests/month at {duration_secs} s average duration ({} mode)",
            ctx.mode
        );

        let mut vectors = vec![
            UsageVector::new(
                SERVICE,
                region,
                "Lambda-GB-Second",
                "GB-s",
                gb_seconds,
                &resource.address,
            )
            .with_confidence(Confidence::Low)
            .with_formula(format!(
                "{requests} requests x {duration_secs} s x {memory_gb} GB = {gb_seconds} GB-s"
            ))
            .with_assumption(usage_note.clone()),
            UsageVector::new(
                SERVICE,
                region,
                "Request",
                "Requests",
                requests,
                &resource.address,
            )
            .with_confidence(Confidence::Low)
            .with_formula(format!("{requests} requests/month"))
            .with_assumption(usage_note),
        ];

        let reserved = resource
            .num_attr("reserved_concurrent_executions")
            .unwrap_or(0.0);
        if reserved > 0.0 {
            let concurrency_gb_hours = reserved * memory_gb * HOURS_PER_MONTH;
            vectors.push(
                UsageVector::new(
                    SERVICE,
                    region,
                    "Lambda-Provisioned-Concurrency",
                    "Concurrency-GB-Hrs",
                    concurrency_gb_hours,
                    &resource.address,
                )
                .with_confidence(Confidence::Low)
                .with_formula(format!(
                    "{reserved} reserved executions x {memory_gb} GB x {HOURS_PER_MONTH} hrs"
                ))
                .with_assumption(format!(
                    "assumed provisioned concurrency held for {HOURS_PER_MONTH} hours/month"
                )),
            );
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::EvaluationMode;
    use crate::model::AttrValue;

    fn function(memory_mb: f64) -> Resource {
        Resource::new("aws_lambda_function.handler", "aws_lambda_function")
            .with_region("us-east-1")
            .with_attr("function_name", AttrValue::Str("handler".into()))
            .with_attr("memory_size", AttrValue::Num(memory_mb))
    }

    #[test]
    fn conservative_defaults_produce_gb_seconds_and_requests() {
        let vectors = LambdaAdapter
            .extract(
                &function(512.0),
                &AdapterContext::new(EvaluationMode::Conservative),
            )
            .unwrap();
        assert_eq!(vectors.len(), 2);

        // 1000 requests x 1 s x 0.5 GB
        let compute = &vectors[0];
        assert_eq!(compute.usage_type, "Lambda-GB-Second");
        assert_eq!(compute.quantity, 500.0);
        assert_eq!(compute.confidence, Confidence::Low);
        assert!(compute.assumptions[0].contains("CONSERVATIVE"));

        let requests = &vectors[1];
        assert_eq!(requests.usage_type, "Request");
        assert_eq!(requests.quantity, 1000.0);
        assert_eq!(requests.confidence, Confidence::Low);
    }

    #[test]
    fn strict_mode_names_the_assumed_request_count() {
        let err = LambdaAdapter
            .extract(&function(512.0), &AdapterContext::new(EvaluationMode::Strict))
            .unwrap_err();
        let text = err.to_string();
        assert_eq!(err.code(), "E_STRICT_MODE");
        assert!(text.contains("lambda_monthly_requests"));
        assert!(text.contains("aws_lambda_function.handler"));
    }

    #[test]
    fn provisioned_concurrency_only_when_reserved() {
        let plain = LambdaAdapter
            .extract(
                &function(512.0),
                &AdapterContext::new(EvaluationMode::Conservative),
            )
            .unwrap();
        assert!(!plain
            .iter()
            .any(|v| v.usage_type == "Lambda-Provisioned-Concurrency"));

        let reserved = function(1024.0)
            .with_attr("reserved_concurrent_executions", AttrValue::Num(2.0));
        let vectors = LambdaAdapter
            .extract(&reserved, &AdapterContext::new(EvaluationMode::Conservative))
            .unwrap();
        let concurrency = vectors
            .iter()
            .find(|v| v.usage_type == "Lambda-Provisioned-Concurrency")
            .unwrap();
        // 2 executions x 1 GB x 730 hrs
        assert_eq!(concurrency.quantity, 1460.0);
    }
}
