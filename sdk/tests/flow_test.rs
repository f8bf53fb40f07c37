//! Submission flows against an in-memory ledger

use anchor_lang::AnchorDeserialize;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tuktuk_sdk::flow::{
    add_cron_transaction, allocate_slot, create_cron_job, cron_job_for_name, fund_account,
    queue_task, resolve_queue,
};
use tuktuk_sdk::instructions::{build_memo_instruction, instruction_discriminator};
use tuktuk_sdk::monitor::{closing_signature, wait_for_task};
use tuktuk_sdk::pda::{CronSeeds, TuktukSeeds, CRON_PROGRAM_ID, TUKTUK_PROGRAM_ID};
use tuktuk_sdk::state::{CronJobNameMappingV0, TaskQueueNameMappingV0, TuktukConfigV0, UserCronJobsV0};
use tuktuk_sdk::testing::{anchor_account_data, task_queue_data, InMemoryLedger};
use tuktuk_sdk::*;

fn fast_monitor(max_attempts: u32) -> MonitorConfig {
    MonitorConfig {
        poll_interval: Duration::from_millis(1),
        max_attempts,
        timeout: Duration::from_secs(5),
    }
}

/// Registers a queue under `name` and returns its address
fn seed_queue(ledger: &InMemoryLedger, name: &str, bitmap: &[u8]) -> Pubkey {
    let (tuktuk_config, _) = TuktukSeeds::tuktuk_config().unwrap();
    let (task_queue, _) = TuktukSeeds::task_queue(&tuktuk_config, 0).unwrap();
    let (mapping, _) = TuktukSeeds::task_queue_name_mapping(&tuktuk_config, name).unwrap();
    let (authority, _) = TuktukSeeds::task_queue_authority(&task_queue, &ledger.payer()).unwrap();

    ledger.set_account(
        mapping,
        anchor_account_data(&TaskQueueNameMappingV0 {
            task_queue,
            name: name.to_string(),
            bump_seed: 255,
        })
        .unwrap(),
    );
    ledger.set_account(authority, vec![0u8; 8]);
    ledger.set_account(task_queue, task_queue_data(bitmap.len() as u16 * 8, bitmap));
    task_queue
}

fn split_data(data: &[u8]) -> (&[u8], &[u8]) {
    data.split_at(8)
}

#[tokio::test]
async fn test_resolve_existing_queue() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0]);

    let resolved = resolve_queue(&ledger, &QueueConfig::default()).await.unwrap();

    assert_eq!(resolved, task_queue);
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_resolve_adds_missing_authority() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0]);
    let (authority, _) = TuktukSeeds::task_queue_authority(&task_queue, &ledger.payer()).unwrap();
    ledger.close_after_reads(authority, 0);

    resolve_queue(&ledger, &QueueConfig::default()).await.unwrap();

    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    let (disc, _) = split_data(&sent[0][0].data);
    assert_eq!(disc, instruction_discriminator("add_queue_authority_v0"));
    assert!(sent[0][0].accounts.iter().any(|meta| meta.pubkey == authority));
}

#[tokio::test]
async fn test_resolve_creates_missing_queue() {
    let ledger = InMemoryLedger::new();
    let (tuktuk_config, _) = TuktukSeeds::tuktuk_config().unwrap();
    ledger.set_account(
        tuktuk_config,
        anchor_account_data(&TuktukConfigV0 {
            min_task_queue_id: 0,
            next_task_queue_id: 7,
            authority: Pubkey::new_unique(),
            min_deposit: 0,
            bump_seed: 254,
        })
        .unwrap(),
    );

    let config = QueueConfig::named("fresh-queue");
    let resolved = resolve_queue(&ledger, &config).await.unwrap();

    let (expected, _) = TuktukSeeds::task_queue(&tuktuk_config, 7).unwrap();
    assert_eq!(resolved, expected);

    let sent = ledger.sent();
    assert_eq!(sent.len(), 2);

    let init = &sent[0][0];
    assert_eq!(init.program_id, TUKTUK_PROGRAM_ID);
    let (disc, mut body) = split_data(&init.data);
    assert_eq!(disc, instruction_discriminator("initialize_task_queue_v0"));
    let args = InitializeTaskQueueArgsV0::deserialize(&mut body).unwrap();
    assert_eq!(args.name, "fresh-queue");
    assert_eq!(args.capacity, 10);
    assert_eq!(args.min_crank_reward, 10_000);
    assert_eq!(args.stale_task_age, 48 * 60 * 60);

    let (disc, _) = split_data(&sent[1][0].data);
    assert_eq!(disc, instruction_discriminator("add_queue_authority_v0"));
}

#[tokio::test]
async fn test_resolve_missing_queue_without_create() {
    let ledger = InMemoryLedger::new();
    let config = QueueConfig {
        create_if_missing: false,
        ..QueueConfig::named("nowhere")
    };

    let err = resolve_queue(&ledger, &config).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_queue_task_takes_lowest_free_slot() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0b0000_0111]);
    let memo = build_memo_instruction("Hello TukTuk!", &[]);

    let queued = queue_task(
        &ledger,
        &task_queue,
        QueueTaskRequest::now(vec![memo.clone()], "memo: Hello TukTuk!"),
    )
    .await
    .unwrap();

    assert_eq!(queued.task_id, 3);
    assert_eq!(queued.task, TuktukSeeds::task(&task_queue, 3).unwrap().0);

    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    let ix = &sent[0][0];
    assert_eq!(ix.accounts[4].pubkey, queued.task);

    let (disc, mut body) = split_data(&ix.data);
    assert_eq!(disc, instruction_discriminator("queue_task_v0"));
    let args = QueueTaskArgsV0::deserialize(&mut body).unwrap();
    assert_eq!(args.id, 3);
    assert_eq!(args.trigger, TriggerV0::Now);
    assert_eq!(args.description, "memo: Hello TukTuk!");
    assert_eq!(
        args.transaction,
        TransactionSourceV0::CompiledV0(compile_transaction(&[memo], vec![]).unwrap())
    );
}

#[tokio::test]
async fn test_queue_task_on_full_queue() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0xFF, 0xFF]);

    let err = queue_task(
        &ledger,
        &task_queue,
        QueueTaskRequest::now(vec![build_memo_instruction("full", &[])], "memo: full"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::QueueFull(queue) if queue == task_queue));
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_allocate_slot_on_missing_queue() {
    let ledger = InMemoryLedger::new();
    let err = allocate_slot(&ledger, &Pubkey::new_unique()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_allocate_slot_reads_bitmap() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0xFF, 0b1111_1011]);
    assert_eq!(allocate_slot(&ledger, &task_queue).await.unwrap(), 10);
}

#[tokio::test]
async fn test_padding_bits_past_capacity_are_not_free() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0]);
    // capacity 10: slots 8 and 9 live in the second byte, bits 2..8 are padding
    ledger.set_account(task_queue, task_queue_data(10, &[0xFF, 0b0000_0011]));

    let err = allocate_slot(&ledger, &task_queue).await.unwrap_err();
    assert!(matches!(err, Error::QueueFull(queue) if queue == task_queue));

    ledger.set_account(task_queue, task_queue_data(10, &[0xFF, 0b0000_0001]));
    assert_eq!(allocate_slot(&ledger, &task_queue).await.unwrap(), 9);
}

#[tokio::test]
async fn test_create_cron_job_uses_next_id() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0b0000_0001]);
    let (user_cron_jobs, _) = CronSeeds::user_cron_jobs(&ledger.payer()).unwrap();
    ledger.set_account(
        user_cron_jobs,
        anchor_account_data(&UserCronJobsV0 {
            min_cron_job_id: 0,
            next_cron_job_id: 2,
            authority: ledger.payer(),
            bump_seed: 253,
        })
        .unwrap(),
    );

    let cron_job = create_cron_job(&ledger, &task_queue, &CronConfig::default())
        .await
        .unwrap();

    assert_eq!(cron_job, CronSeeds::cron_job(&ledger.payer(), 2).unwrap().0);

    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    let ix = &sent[0][0];
    assert_eq!(ix.program_id, CRON_PROGRAM_ID);
    let task = TuktukSeeds::task(&task_queue, 1).unwrap().0;
    assert!(ix.accounts.iter().any(|meta| meta.pubkey == task));

    let (disc, mut body) = split_data(&ix.data);
    assert_eq!(disc, instruction_discriminator("initialize_cron_job_v0"));
    let args = InitializeCronJobArgsV0::deserialize(&mut body).unwrap();
    assert_eq!(args.name, "my-cron-job");
    assert_eq!(args.schedule, "0 * * * * *");
    assert_eq!(args.num_tasks_per_queue_call, 1);
}

#[tokio::test]
async fn test_first_cron_job_gets_id_zero() {
    let ledger = InMemoryLedger::new();
    let task_queue = seed_queue(&ledger, "banana-queue", &[0]);

    let cron_job = create_cron_job(&ledger, &task_queue, &CronConfig::default())
        .await
        .unwrap();

    assert_eq!(cron_job, CronSeeds::cron_job(&ledger.payer(), 0).unwrap().0);
}

#[tokio::test]
async fn test_cron_job_for_name() {
    let ledger = InMemoryLedger::new();
    let authority = ledger.payer();
    let cron_job = Pubkey::new_unique();
    let (mapping, _) = CronSeeds::cron_job_name_mapping(&authority, "my-cron-job").unwrap();
    ledger.set_account(
        mapping,
        anchor_account_data(&CronJobNameMappingV0 {
            cron_job,
            name: "my-cron-job".to_string(),
            bump_seed: 250,
        })
        .unwrap(),
    );

    let found = cron_job_for_name(&ledger, &authority, "my-cron-job").await.unwrap();
    let missing = cron_job_for_name(&ledger, &authority, "other-job").await.unwrap();

    assert_eq!(found, Some(cron_job));
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_cron_job_for_name_rejects_foreign_account() {
    let ledger = InMemoryLedger::new();
    let authority = ledger.payer();
    let (mapping, _) = CronSeeds::cron_job_name_mapping(&authority, "my-cron-job").unwrap();
    ledger.set_account(mapping, vec![0u8; 80]);

    let err = cron_job_for_name(&ledger, &authority, "my-cron-job").await.unwrap_err();
    assert!(matches!(err, Error::DiscriminatorMismatch { .. }));
}

#[tokio::test]
async fn test_add_cron_transaction_and_fund() {
    let ledger = InMemoryLedger::new();
    let cron_job = Pubkey::new_unique();
    let compiled = compile_transaction(&[build_memo_instruction("Hello TukTuk!", &[])], vec![]).unwrap();

    add_cron_transaction(&ledger, &cron_job, 0, compiled.clone()).await.unwrap();
    fund_account(&ledger, &cron_job, 10_000_000).await.unwrap();

    let sent = ledger.sent();
    assert_eq!(sent.len(), 2);

    let (disc, mut body) = split_data(&sent[0][0].data);
    assert_eq!(disc, instruction_discriminator("add_cron_transaction_v0"));
    let args = AddCronTransactionArgsV0::deserialize(&mut body).unwrap();
    assert_eq!(args.index, 0);
    assert_eq!(args.transaction_source, TransactionSourceV0::CompiledV0(compiled.clone()));
    // nothing the executor would have to sign for
    assert_eq!((compiled.num_rw_signers, compiled.num_ro_signers), (0, 0));
    let (cron_job_transaction, _) = CronSeeds::cron_job_transaction(&cron_job, 0).unwrap();
    assert!(sent[0][0].accounts.iter().any(|meta| meta.pubkey == cron_job_transaction));

    let transfer = &sent[1][0];
    assert_eq!(transfer.program_id, solana_sdk::system_program::id());
    assert_eq!(transfer.accounts[1].pubkey, cron_job);
}

#[tokio::test]
async fn test_wait_for_task_sees_close() {
    let ledger = InMemoryLedger::new();
    let task = Pubkey::new_unique();
    ledger.set_account(task, vec![1u8; 8]);
    ledger.close_after_reads(task, 2);

    let attempts = wait_for_task(&ledger, &task, &fast_monitor(10)).await.unwrap();

    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_wait_for_task_times_out() {
    let ledger = InMemoryLedger::new();
    let task = Pubkey::new_unique();
    ledger.set_account(task, vec![1u8; 8]);

    let err = wait_for_task(&ledger, &task, &fast_monitor(4)).await.unwrap_err();

    assert!(matches!(err, Error::MonitorTimeout { attempts: 4, .. }));
}

#[tokio::test]
async fn test_wait_for_task_deadline() {
    let ledger = InMemoryLedger::new();
    let task = Pubkey::new_unique();
    ledger.set_account(task, vec![1u8; 8]);
    let config = MonitorConfig {
        poll_interval: Duration::from_millis(50),
        max_attempts: u32::MAX,
        timeout: Duration::from_millis(120),
    };

    let err = wait_for_task(&ledger, &task, &config).await.unwrap_err();

    assert!(matches!(err, Error::MonitorTimeout { .. }));
}

#[tokio::test]
async fn test_read_errors_are_not_completion() {
    let ledger = InMemoryLedger::new();
    let task = Pubkey::new_unique();
    ledger.set_account(task, vec![1u8; 8]);
    ledger.fail_next_reads(3);

    let err = wait_for_task(&ledger, &task, &fast_monitor(3)).await.unwrap_err();
    assert!(matches!(err, Error::MonitorTimeout { attempts: 3, .. }));

    ledger.fail_next_reads(2);
    ledger.close_after_reads(task, 0);
    let attempts = wait_for_task(&ledger, &task, &fast_monitor(5)).await.unwrap();
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_closing_signature_is_newest() {
    let ledger = InMemoryLedger::new();
    let task = Pubkey::new_unique();
    let queued_in = solana_sdk::signature::Signature::new_unique();
    let ran_in = solana_sdk::signature::Signature::new_unique();
    ledger.record_signature(task, queued_in);
    ledger.record_signature(task, ran_in);

    assert_eq!(closing_signature(&ledger, &task).await.unwrap(), Some(ran_in));
    assert_eq!(closing_signature(&ledger, &Pubkey::new_unique()).await.unwrap(), None);
}
