use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use super::compensation::CompensatedReading;
use super::error::Result;

/// 监视的测量量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// 气压 (Pa)
    Pressure,
    /// 气温 (°C)
    Temperature,
    /// 相对湿度 (%)
    Humidity,
}

impl Metric {
    /// 从补偿结果中取出对应的值
    pub fn select(self, reading: &CompensatedReading) -> f64 {
        match self {
            Metric::Pressure => reading.pressure,
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
        }
    }
}

/// 阈值比较方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// 测量值 < 阈值
    Below,
    /// 测量值 > 阈值
    Above,
}

impl Comparator {
    pub fn holds(self, measurement: f64, threshold: f64) -> bool {
        match self {
            Comparator::Below => measurement < threshold,
            Comparator::Above => measurement > threshold,
        }
    }
}

/// 阈值监视器句柄
///
/// 每个监视器是一个独立线程：采样、比较、满足条件时调用回调，然后等待一个周期。
/// 条件持续满足时每个周期都会调用回调(非边沿触发)。
///
/// 丢弃句柄会停止监视器；需要让监视器一直运行时调用 [`Watcher::detach`]。
pub struct Watcher {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    /// 启动监视线程
    ///
    /// `sample` 完成一次完整的采样与补偿；一次采样期间不会被其他监视器打断。
    pub(crate) fn spawn<S, F>(
        mut sample: S,
        metric: Metric,
        comparator: Comparator,
        threshold: f64,
        interval: Duration,
        mut callback: F,
    ) -> Result<Self>
    where
        S: FnMut() -> Result<CompensatedReading> + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(format!("bme280-{:?}-{:?}", metric, comparator).to_lowercase())
            .spawn(move || {
                loop {
                    // 采样并比较
                    match sample() {
                        Ok(reading) => {
                            if comparator.holds(metric.select(&reading), threshold) {
                                callback();
                            }
                        }
                        Err(err) => warn!("阈值监视器 {:?} 采样失败: {}", metric, err),
                    }

                    // 等待下一个周期，收到停止信号或句柄被丢弃时退出
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("阈值监视器 {:?} {:?} {} 已停止", metric, comparator, threshold);
            })?;

        // OK
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// 监视线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// 停止监视器并等待线程退出
    ///
    /// 正在进行的采样周期会先完成。
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// 放弃句柄，监视器在进程生命周期内一直运行
    pub fn detach(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // 发送端永不释放，通道不会断开
            std::mem::forget(stop_tx);
        }
        self.handle.take();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("阈值监视线程异常退出");
            }
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
