// EC2 instance adapter: compute hours, EBS volumes, optional data transfer

use crate::adapters::{require_region, require_str_attr, AdapterContext, UsageAdapter};
use crate::errors::Result;
use crate::model::{AttrValue, Confidence, Resource, UsageVector};

const SERVICE: &str = "AmazonEC2";

/// gp3 bundles this much before extra charges apply.
const GP3_BASELINE_IOPS: f64 = 3000.0;
const GP3_BASELINE_THROUGHPUT_MBPS: f64 = 125.0;

pub struct Ec2Adapter;

impl UsageAdapter for Ec2Adapter {
    fn name(&self) -> &'static str {
        "ec2"
    }

    fn supports(&self, resource_type: &str) -> bool {
        resource_type == "aws_instance"
    }

    fn extract(&self, resource: &Resource, ctx: &AdapterContext) -> Result<Vec<UsageVector>> {
        let region = require_region(resource)?;
        let instance_type = require_str_attr(resource, "instance_type")?;
        let confidence = resource.confidence();

        let hours = ctx.mode.ec2_monthly_hours(&resource.address)?;
        let operating_system = operating_system(resource);
        let tenancy = tenancy(resource.str_attr("tenancy"));

        let mut vectors = vec![UsageVector::new(
            SERVICE,
            region,
            format!("BoxUsage:{instance_type}"),
            "Hrs",
            hours,
            &resource.address,
        )
        .with_attr("instanceType", instance_type)
        .with_attr("operatingSystem", operating_system)
        .with_attr("tenancy", tenancy)
        .with_confidence(confidence)
        .with_formula(format!("{hours} instance-hours of {instance_type}"))
        .with_assumption(format!(
            "assumed {hours} running hours/month ({} mode)",
            ctx.mode
        ))];

        for device in block_devices(resource) {
            extract_volume(&device, resource, region, confidence, &mut vectors);
        }

        if ctx.include_data_transfer {
            let gb = ctx.mode.data_transfer_gb(&resource.address)?;
            vectors.push(
                UsageVector::new(
                    SERVICE,
                    region,
                    "DataTransfer-Out-Bytes",
                    "GB",
                    gb,
                    &resource.address,
                )
                .with_confidence(Confidence::Low)
                .with_formula(format!("{gb} GB data transfer out (assumed)"))
                .with_assumption(format!(
                    "assumed {gb} GB/month data transfer out ({} mode)",
                    ctx.mode
                )),
            );
        }

        Ok(vectors)
    }
}

fn operating_system(resource: &Resource) -> &'static str {
    match resource.str_attr("platform") {
        Some("windows") => "Windows",
        _ => "Linux",
    }
}

/// Terraform tenancy values map onto the catalog vocabulary.
fn tenancy(value: Option<&str>) -> &'static str {
    match value {
        Some("dedicated") => "Dedicated",
        Some("host") => "Host",
        _ => "Shared",
    }
}

struct BlockDevice {
    label: String,
    volume_type: String,
    volume_size: f64,
    iops: Option<f64>,
    throughput: Option<f64>,
}

fn block_devices(resource: &Resource) -> Vec<BlockDevice> {
    let mut devices = Vec::new();
    if let Some(root) = resource.attr("root_block_device") {
        collect_devices("root_block_device", root, &mut devices);
    }
    if let Some(ebs) = resource.attr("ebs_block_device") {
        collect_devices("ebs_block_device", ebs, &mut devices);
    }
    devices
}

fn collect_devices(label: &str, value: &AttrValue, out: &mut Vec<BlockDevice>) {
    match value {
        AttrValue::Map(_) => out.push(block_device(label.to_string(), value)),
        AttrValue::List(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.as_map().is_some() {
                    out.push(block_device(format!("{label}[{index}]"), item));
                }
            }
        }
        _ => {}
    }
}

fn block_device(label: String, value: &AttrValue) -> BlockDevice {
    BlockDevice {
        label,
        volume_type: value
            .get("volume_type")
            .and_then(AttrValue::as_str)
            .unwrap_or("gp3")
            .to_string(),
        volume_size: value
            .get("volume_size")
            .and_then(AttrValue::as_f64)
            .unwrap_or(8.0),
        iops: value.get("iops").and_then(AttrValue::as_f64),
        throughput: value.get("throughput").and_then(AttrValue::as_f64),
    }
}

fn extract_volume(
    device: &BlockDevice,
    resource: &Resource,
    region: &str,
    confidence: Confidence,
    vectors: &mut Vec<UsageVector>,
) {
    vectors.push(
        UsageVector::new(
            SERVICE,
            region,
            format!("EBS:VolumeUsage.{}", device.volume_type),
            "GB-Mo",
            device.volume_size,
            &resource.address,
        )
        .with_attr("volumeType", &device.volume_type)
        .with_confidence(confidence)
        .with_formula(format!(
            "{} GB {} volume ({})",
            device.volume_size, device.volume_type, device.label
        )),
    );

    match device.volume_type.as_str() {
        "io1" | "io2" => {
            if let Some(iops) = device.iops {
                vectors.push(
                    UsageVector::new(
                        SERVICE,
                        region,
                        format!("EBS:VolumeP-IOPS.{}", device.volume_type),
                        "IOPS-Mo",
                        iops,
                        &resource.address,
                    )
                    .with_confidence(confidence)
                    .with_formula(format!(
                        "{iops} provisioned IOPS ({})",
                        device.label
                    )),
                );
            }
        }
        "gp3" => {
            let extra_iops = device.iops.map(|i| i - GP3_BASELINE_IOPS).unwrap_or(0.0);
            if extra_iops > 0.0 {
                vectors.push(
                    UsageVector::new(
                        SERVICE,
                        region,
                        "EBS:VolumeP-IOPS.gp3",
                        "IOPS-Mo",
                        extra_iops,
                        &resource.address,
                    )
                    .with_confidence(confidence)
                    .with_formula(format!(
                        "{extra_iops} IOPS above the gp3 baseline of {GP3_BASELINE_IOPS} ({})",
                        device.label
                    )),
                );
            }
            let extra_throughput = device
                .throughput
                .map(|t| t - GP3_BASELINE_THROUGHPUT_MBPS)
                .unwrap_or(0.0);
            if extra_throughput > 0.0 {
                vectors.push(
                    UsageVector::new(
                        SERVICE,
                        region,
                        "EBS:VolumeP-Throughput.gp3",
                        "MBps-Mo",
                        extra_throughput,
                        &resource.address,
                    )
                    .with_confidence(confidence)
                    .with_formula(format!(
                        "{extra_throughput} MBps above the gp3 baseline of {GP3_BASELINE_THROUGHPUT_MBPS} ({})",
                        device.label
                    )),
                );
            }
        }
        _ => {}
    }
}
