#[cfg(test)]
mod integration_tests {
    use crate::backends::local::Kernel;
    use crate::config::{load_and_validate_config, ExecutorKind, RuntimeBuilder};
    use crate::errors::{InferError, StatusCode};
    use crate::partition::Blob;
    use crate::traits::{WaitMode, WaitStatus};

    /// Test that YAML configurations can be loaded and parsed correctly
    #[test]
    fn test_three_device_chain_yaml_loading() {
        let config = load_and_validate_config("configs/three-device-chain.yaml").unwrap();

        assert_eq!(config.callback_executor, ExecutorKind::Tokio);
        assert_eq!(config.iterations(), 2);
        assert_eq!(config.partitions.len(), 3);
        assert_eq!(config.partitions[0].device, "GPU.0");
        assert_eq!(config.partitions[1].kernel, Kernel::Relu);
        assert_eq!(config.partitions[2].inputs, vec!["activated"]);
    }

    #[test]
    fn test_faulty_accelerator_yaml_loading() {
        let config = load_and_validate_config("configs/faulty-accelerator.yaml").unwrap();

        assert_eq!(config.callback_executor, ExecutorKind::Immediate);
        assert_eq!(config.partitions[1].fail_with, Some(StatusCode::GeneralError));
        assert_eq!(config.partitions[0].kernel, Kernel::Identity);
    }

    #[test]
    fn test_single_device_toml_loading() {
        let config = load_and_validate_config("configs/single-device.toml").unwrap();

        assert_eq!(config.partitions.len(), 1);
        assert_eq!(
            config.partitions[0].kernel,
            Kernel::Affine {
                scale: 2.0,
                bias: 0.0
            }
        );
    }

    /// Test building and running an orchestrator from YAML configuration
    #[test]
    fn test_runtime_from_yaml_computes_outputs() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = load_and_validate_config("configs/three-device-chain.yaml").unwrap();
        let orchestrator = RuntimeBuilder::from_config(&config, runtime.handle().clone()).unwrap();

        orchestrator
            .get_blob("x")
            .unwrap()
            .write(vec![0.0, 1.0, 2.0]);
        orchestrator.infer().unwrap();

        assert_eq!(orchestrator.get_blob("y").unwrap().read(), vec![0.5, 1.5, 3.5]);
        assert_eq!(orchestrator.pipeline_len(), 3);
    }

    #[test]
    fn test_runtime_from_yaml_reports_device_failure() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = load_and_validate_config("configs/faulty-accelerator.yaml").unwrap();
        let orchestrator = RuntimeBuilder::from_config(&config, runtime.handle().clone()).unwrap();

        orchestrator.set_blob("x", Blob::from_vec(vec![1.0])).unwrap();
        orchestrator.start().unwrap();
        let error = orchestrator.wait(WaitMode::ResultReady).unwrap_err();

        assert!(matches!(error, InferError::GeneralError(_)));
        assert!(error.to_string().contains("FPGA"));
        assert_eq!(
            orchestrator.wait(WaitMode::StatusOnly).unwrap_err(),
            error
        );
    }

    #[test]
    fn test_runtime_from_toml_with_timeout_wait() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = load_and_validate_config("configs/single-device.toml").unwrap();
        let orchestrator = RuntimeBuilder::from_config(&config, runtime.handle().clone()).unwrap();

        orchestrator.set_blob("x", Blob::from_vec(vec![1.5])).unwrap();
        orchestrator.start().unwrap();

        assert_eq!(
            orchestrator.wait(config.wait_mode()),
            Ok(WaitStatus::Ready)
        );
        assert_eq!(orchestrator.get_blob("y").unwrap().read(), vec![3.0]);
    }
}
