#[cfg(test)]
mod tests {
    use crate::deploy::apply;
    use crate::error::Error;
    use crate::exports::Exports;
    use crate::module_testing::fake::*;
    use crate::plan::{DEFAULT_BINDING, EAST_BINDING};
    use crate::resources::*;

    #[tokio::test]
    async fn supplied_certificate_skips_acm() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", Some(SUPPLIED_ARN)), &cloud)
            .await
            .unwrap();

        assert_eq!(site.certificate, CertificateSource::Supplied(SUPPLIED_ARN.to_string()));
        assert!(!site.plan.contains_type("sitestack:acm:Certificate"));
        assert!(!site.plan.contains_type("sitestack:acm:CertificateValidation"));
        assert!(site.plan.get("www.example.com-validation").is_none());
        assert_eq!(site.plan.bindings().keys().collect::<Vec<_>>(), vec![DEFAULT_BINDING]);

        let state = apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();
        assert!(state.contains("cdn"));
        let calls = cloud.calls();
        assert!(!calls.iter().any(|c| c.contains("RequestCertificate")));
        assert!(!calls.iter().any(|c| c.contains("WaitForValidation")));

        let recorded = cloud.recorded.lock().unwrap();
        assert_eq!(recorded.distributions.len(), 1);
        assert_eq!(recorded.distributions[0].viewer_certificate.acm_certificate_arn, SUPPLIED_ARN);
    }

    #[tokio::test]
    async fn provisioned_certificate_is_validated_before_the_distribution() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        assert_eq!(
            site.certificate,
            CertificateSource::Provisioned {
                certificate: "certificate".into(),
                validation_record: "www.example.com-validation".into(),
                validation: "certificateValidation".into(),
            }
        );
        assert_eq!(site.plan.get("certificate").unwrap().binding, EAST_BINDING);
        assert_eq!(site.plan.get("certificateValidation").unwrap().binding, EAST_BINDING);
        assert_eq!(site.plan.bindings()[EAST_BINDING].region, "us-east-1");

        apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();
        assert_eq!(
            cloud.calls(),
            vec![
                "us-west-2 CreateOriginAccessIdentity dev-S3-identity",
                "us-west-2 CreateBucket www.example.com",
                "us-east-1 FindCertificate www.example.com",
                "us-east-1 RequestCertificate www.example.com",
                "us-west-2 UpsertRecord _x1.www.example.com.",
                "us-east-1 WaitForValidation _x1.www.example.com.",
                "us-west-2 CreateBucket www.example.com-logs",
                "us-west-2 CreateDistribution dev-cdn",
                "us-west-2 UpsertRecord www.example.com.",
                "us-west-2 PutBucketPolicy www.example.com",
            ]
        );

        let recorded = cloud.recorded.lock().unwrap();
        let validation_record = &recorded.records[0];
        assert_eq!(validation_record.ttl, Some(600));
        assert_eq!(validation_record.record_type, "CNAME");
        assert_eq!(validation_record.records, vec!["_x2.acm-validations.aws.".to_string()]);
        assert_eq!(validation_record.zone.id, "ZEXAMPLE");
        assert_eq!(
            recorded.distributions[0].viewer_certificate.acm_certificate_arn,
            "arn:aws:acm:us-east-1:123456789012:certificate/dev-certificate"
        );
    }

    #[tokio::test]
    async fn existing_certificate_of_the_stack_is_reused() {
        let cloud = FakeCloud::new("us-west-2").with_certificate(existing_certificate("www.example.com", "dev"));
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        let state = apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();

        let calls = cloud.calls();
        assert!(calls.contains(&"us-east-1 FindCertificate www.example.com".to_string()));
        assert!(!calls.iter().any(|c| c.contains("RequestCertificate")));
        assert!(calls.contains(&"us-east-1 WaitForValidation _x1.www.example.com.".to_string()));
        assert_eq!(state.attribute("certificate", Certificate::ARN), Some(EXISTING_ARN));

        let recorded = cloud.recorded.lock().unwrap();
        assert_eq!(recorded.distributions[0].viewer_certificate.acm_certificate_arn, EXISTING_ARN);
    }

    #[tokio::test]
    async fn certificate_of_another_stack_is_not_reused() {
        let cloud = FakeCloud::new("us-west-2").with_certificate(existing_certificate("www.example.com", "prod"));
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();

        assert!(cloud.calls().contains(&"us-east-1 RequestCertificate www.example.com".to_string()));
        let recorded = cloud.recorded.lock().unwrap();
        assert_ne!(recorded.distributions[0].viewer_certificate.acm_certificate_arn, EXISTING_ARN);
    }

    #[tokio::test]
    async fn validation_record_must_match_the_certificate() {
        let cloud = FakeCloud::new("us-east-1");
        let tags = Tags::new();
        let request = cloud
            .request_certificate("dev-certificate", &Certificate::dns_validated("www.example.com", &tags))
            .await
            .unwrap();

        let matching = CertificateValidation {
            certificate_arn: request.arn.clone(),
            validation_record_fqdns: vec!["_x1.www.example.com".to_string()],
            timeout_minutes: 75,
        };
        assert!(cloud.wait_for_certificate_validation(&matching).await.is_ok());

        let other = CertificateValidation {
            validation_record_fqdns: vec!["_x1.example.com.".to_string()],
            ..matching
        };
        let err = cloud.wait_for_certificate_validation(&other).await.unwrap_err();
        assert!(matches!(err, Error::CertificateValidation { arn, .. } if arn == request.arn));
    }

    #[tokio::test]
    async fn apply_does_not_wait_for_distribution_deployment() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", Some(SUPPLIED_ARN)), &cloud)
            .await
            .unwrap();
        let state = apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();
        assert_eq!(state.attribute("cdn", Distribution::STATUS), Some("InProgress"));
        let calls = cloud.calls();
        let created = calls.iter().position(|c| c.ends_with("CreateDistribution dev-cdn")).unwrap();
        assert_eq!(calls[created + 1], "us-west-2 UpsertRecord www.example.com.");
    }

    #[tokio::test]
    async fn alias_record_points_at_the_distribution() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", Some(SUPPLIED_ARN)), &cloud)
            .await
            .unwrap();
        apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();

        let recorded = cloud.recorded.lock().unwrap();
        assert_eq!(recorded.zone_lookups, vec!["example.com.".to_string()]);
        let alias = recorded.records.last().unwrap();
        assert_eq!(alias.name, "www");
        assert_eq!(alias.zone.name, "example.com.");
        assert_eq!(alias.record_type, "A");
        assert_eq!(alias.ttl, None);
        assert_eq!(alias.aliases[0].name, "d111111abcdef8.cloudfront.net");
        assert_eq!(alias.aliases[0].zone_id, "Z2FDTNDATAQYW2");
        assert!(alias.aliases[0].evaluate_target_health);
    }

    #[tokio::test]
    async fn apex_domain_is_its_own_zone() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("example.com", Some(SUPPLIED_ARN)), &cloud)
            .await
            .unwrap();
        apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();

        let recorded = cloud.recorded.lock().unwrap();
        assert_eq!(recorded.zone_lookups, vec!["example.com.".to_string()]);
        let alias = recorded.records.last().unwrap();
        assert_eq!(alias.name, "");
        assert_eq!(alias.fqdn(), "example.com.");
    }

    #[tokio::test]
    async fn missing_zone_fails_the_build() {
        let cloud = FakeCloud::new("us-west-2").without_zones();
        let err = StaticWebsite::build(&config("www.example.com", None), &cloud)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound(zone) if zone == "example.com."));
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn validation_failure_stops_the_apply() {
        let cloud = FakeCloud::new("us-west-2").failing_validation();
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        let err = apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap_err();
        match err {
            Error::Provision { logical_id, source } => {
                assert_eq!(logical_id, "certificateValidation");
                assert!(matches!(*source, Error::CertificateValidation { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        let calls = cloud.calls();
        assert!(!calls.iter().any(|c| c.contains("CreateDistribution")));
        assert!(!calls.iter().any(|c| c.contains("PutBucketPolicy")));
    }

    #[tokio::test]
    async fn outputs_resolve_after_apply() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", None), &cloud).await.unwrap();
        let state = apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();
        let exports = Exports::resolve(&site.plan, &state).unwrap();

        assert_eq!(exports.get("content_bucket_url"), Some("s3://www.example.com"));
        assert_eq!(
            exports.get("content_bucket_website_endpoint"),
            Some("www.example.com.s3-website-us-west-2.amazonaws.com")
        );
        assert_eq!(exports.get("cloudfront_domain"), Some("d111111abcdef8.cloudfront.net"));
        assert_eq!(exports.get("target_domain_endpoint"), Some("https://www.example.com/"));
        assert_eq!(
            exports.get("identity"),
            Some("arn:aws:iam::cloudfront:user/CloudFront Origin Access Identity E2FAKEIDENTITY")
        );
        assert_eq!(exports.get("identity.id"), Some("E2FAKEIDENTITY"));
        assert_eq!(exports.get("s3"), Some("www.example.com"));
        assert_eq!(exports.get("name"), Some("www.example.com.s3.us-west-2.amazonaws.com"));
    }

    #[tokio::test]
    async fn bucket_policy_grants_the_identity_read_access() {
        let cloud = FakeCloud::new("us-west-2");
        let site = StaticWebsite::build(&config("www.example.com", Some(SUPPLIED_ARN)), &cloud)
            .await
            .unwrap();
        apply(&site.plan, &cloud.providers(&site.plan)).await.unwrap();

        let recorded = cloud.recorded.lock().unwrap();
        let (bucket, policy) = &recorded.policies[0];
        assert_eq!(bucket, "www.example.com");
        let policy: serde_json::Value = serde_json::from_str(policy).unwrap();
        let statement = &policy["Statement"][0];
        assert_eq!(
            statement["Principal"]["AWS"][0],
            "arn:aws:iam::cloudfront:user/CloudFront Origin Access Identity E2FAKEIDENTITY"
        );
        assert_eq!(
            statement["Resource"],
            serde_json::json!(["arn:aws:s3:::www.example.com", "arn:aws:s3:::www.example.com/*"])
        );
    }

    #[tokio::test]
    async fn plan_loads_from_a_stack_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(crate::config::stack_file_path(dir.path(), "dev"), DEV_STACK).unwrap();
        let config = crate::config::StackConfig::load(dir.path(), "dev").unwrap();
        let site = StaticWebsite::build(&config, &FakeCloud::new("us-west-2")).await.unwrap();

        let manifest = site.plan.to_manifest().unwrap();
        assert_eq!(manifest["Providers"]["east"]["Region"], "us-east-1");
        assert_eq!(manifest["Resources"]["certificate"]["Provider"], "east");
        assert_eq!(
            manifest["Resources"]["cdn"]["Properties"]["viewerCertificate"]["acmCertificateArn"],
            "${certificateValidation.certificate_arn}"
        );
        assert_eq!(manifest["Resources"]["www.example.com-validation"]["Properties"]["ttl"], 600);
        assert_eq!(manifest["Outputs"]["content_bucket_url"], "s3://${contentBucket.bucket}");
    }
}
