pub const DEFAULT_REGION: &str = "us-west-2";

/// CloudFront only accepts ACM certificates issued in us-east-1,
/// regardless of where the rest of the stack lives.
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// S3's default bucket location. CreateBucket there must not carry a location constraint.
pub const S3_DEFAULT_REGION: &str = "us-east-1";

/// Hosted zone id used by every alias record that targets a CloudFront distribution.
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

pub const VALID_AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-north-1",
    "eu-west-3",
    "eu-west-2",
    "eu-west-1",
    "eu-central-1",
    "eu-south-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-east-1",
    "sa-east-1",
    "cn-north-1",
    "cn-northwest-1",
    "us-gov-east-1",
    "us-gov-west-1",
    "me-south-1",
    "af-south-1",
];

// regions that predate the s3-website.<region> endpoint style
const DASH_WEBSITE_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "sa-east-1",
    "us-gov-west-1",
];

pub fn is_valid_region(r: &str) -> bool {
    VALID_AWS_REGIONS.contains(&r)
}

pub fn verify_region(r: &str) -> Option<String> {
    if !is_valid_region(r) {
        Some(format!("Invalid region code {:?}\nMust be one of {:?}", r, VALID_AWS_REGIONS))
    } else {
        None
    }
}

pub fn s3_website_endpoint(bucket: &str, region: &str) -> String {
    if DASH_WEBSITE_REGIONS.contains(&region) {
        format!("{bucket}.s3-website-{region}.amazonaws.com")
    } else {
        format!("{bucket}.s3-website.{region}.amazonaws.com")
    }
}

pub fn s3_regional_domain_name(bucket: &str, region: &str) -> String {
    format!("{bucket}.s3.{region}.amazonaws.com")
}
