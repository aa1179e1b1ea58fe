#[cfg(test)]
mod tests {
    use crate::deploy::{apply, Providers};
    use crate::error::Error;
    use crate::module_testing::fake::*;
    use crate::plan::{Plan, DEFAULT_BINDING};
    use crate::resources::*;

    #[tokio::test]
    async fn missing_binding_is_reported_before_anything_is_created() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        let mut providers = Providers::new();
        providers.insert(DEFAULT_BINDING, cloud.clone());

        let err = apply(&site.plan, &providers).await.unwrap_err();
        assert!(matches!(err, Error::MissingProvider(binding) if binding == "east"));
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn state_collects_every_resource() {
        let cloud = FakeCloud::new("eu-central-1");
        let mut plan = Plan::new("staging", "eu-central-1");
        let bucket = plan.add("logs", Bucket::logs("example.com", &Tags::new())).unwrap();
        plan.export("logs", bucket.attr(Bucket::BUCKET_DOMAIN_NAME));

        let state = apply(&plan, &cloud.providers(&plan)).await.unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.attribute("logs", Bucket::BUCKET), Some("example.com-logs"));
        assert_eq!(
            state.attribute("logs", Bucket::WEBSITE_ENDPOINT),
            Some("example.com-logs.s3-website.eu-central-1.amazonaws.com")
        );
        assert_eq!(cloud.calls(), vec!["eu-central-1 CreateBucket example.com-logs"]);
    }

    #[tokio::test]
    async fn invalid_plan_is_not_applied() {
        let cloud = FakeCloud::new("us-west-2");
        let mut plan = Plan::new("dev", "us-west-2");
        plan.add(
            "policy",
            BucketPolicy {
                bucket: get_att("a", Bucket::ID),
                policy: crate::policy::PolicyDocument::allow_identity_read(
                    get_att("b", OriginAccessIdentity::IAM_ARN),
                    get_att("a", Bucket::ARN),
                ),
            },
        )
        .unwrap();
        plan.add(
            "a",
            BucketPolicy {
                bucket: get_att("policy", Bucket::ID),
                policy: crate::policy::PolicyDocument::allow_identity_read(
                    get_att("policy", OriginAccessIdentity::IAM_ARN),
                    get_att("policy", Bucket::ARN),
                ),
            },
        )
        .unwrap();

        let err = apply(&plan, &cloud.providers(&plan)).await.unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(_)));
        assert!(cloud.calls().is_empty());
    }
}
